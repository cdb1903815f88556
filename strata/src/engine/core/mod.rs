mod transform;
mod vertex;

pub use transform::*;
pub use vertex::*;
