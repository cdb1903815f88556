mod mesh;
mod sprite;

pub use mesh::*;
pub use sprite::*;

use crate::assets::Material;
use crate::rendering::cache::{GpuMesh, GpuProgram};
use crate::rendering::{ProgramId, TextureId};
use nalgebra::Matrix4;
use std::any::Any;
use std::sync::Arc;

/// Sort key of a drawable: the program it is drawn with, then its plain texture.
///
/// `None` stands for the default program or the default texture and sorts first.
pub type SortKey = (Option<ProgramId>, Option<TextureId>);

/// Anything the renderer can draw: shared geometry, a material, a model matrix
/// and optionally a program that replaces the default one.
pub trait Drawable: Any {
    fn mesh(&self) -> &Arc<GpuMesh>;
    fn material(&self) -> &Material;
    fn model_matrix(&self) -> Matrix4<f32>;

    fn program_override(&self) -> Option<&Arc<GpuProgram>> {
        None
    }

    fn sort_key(&self) -> SortKey {
        (
            self.program_override().map(|program| program.id()),
            self.material().texture_id(),
        )
    }
}
