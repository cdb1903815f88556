//! Everything between the scene and the GPU.
//!
//! [`AssetCache`] turns geometry, shader sources and pixels into shared,
//! deduplicated GPU handles. [`Renderer`] walks a [`DrawList`](crate::scene::DrawList)
//! every frame and emits the minimal set of binds through a [`RenderBackend`].

mod backend;
pub mod backends;
pub mod cache;
mod config;
mod context;
pub mod material_binding;
pub mod renderer;
pub mod ring_buffer;
pub mod state;
pub mod uniform;

pub use backend::*;
pub use backends::*;
pub use cache::AssetCache;
pub use config::*;
pub use context::*;
pub use renderer::*;
