mod asset_cache;
mod generic_cache;
pub(crate) mod mesh;
mod refcount;
mod shader;
mod texture;

pub use asset_cache::*;
pub use generic_cache::*;
pub use mesh::GpuMesh;
pub use refcount::*;
pub use shader::*;
pub use texture::*;
