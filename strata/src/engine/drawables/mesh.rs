use crate::assets::Material;
use crate::drawables::Drawable;
use crate::engine::core::Transform;
use crate::rendering::cache::{GpuMesh, GpuProgram};
use nalgebra::Matrix4;
use std::sync::Arc;

/// A mesh placed in 3D space.
#[derive(Debug)]
pub struct MeshDrawable {
    pub mesh: Arc<GpuMesh>,
    pub material: Material,
    pub transform: Transform,
    pub program: Option<Arc<GpuProgram>>,
}

impl MeshDrawable {
    pub fn new(mesh: Arc<GpuMesh>, material: Material) -> Self {
        MeshDrawable {
            mesh,
            material,
            transform: Transform::new(),
            program: None,
        }
    }

    pub fn with_program(mut self, program: Arc<GpuProgram>) -> Self {
        self.program = Some(program);
        self
    }
}

impl Drawable for MeshDrawable {
    fn mesh(&self) -> &Arc<GpuMesh> {
        &self.mesh
    }

    fn material(&self) -> &Material {
        &self.material
    }

    fn model_matrix(&self) -> Matrix4<f32> {
        self.transform.model_matrix()
    }

    fn program_override(&self) -> Option<&Arc<GpuProgram>> {
        self.program.as_ref()
    }
}
