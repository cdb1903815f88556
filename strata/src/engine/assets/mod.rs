pub mod geometry;
pub mod hash;
pub mod material;
pub mod shader;
pub mod texture;

pub use geometry::*;
pub use hash::*;
pub use material::*;
pub use shader::*;
pub use texture::*;
