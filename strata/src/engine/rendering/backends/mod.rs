mod recording;
mod wgpu_backend;

pub use recording::*;
pub use wgpu_backend::*;
