use crate::assets::{Geometry, Material};
use crate::drawables::Drawable;
use crate::engine::core::UNIT_SQUARE_VERT;
use crate::error::Result;
use crate::rendering::cache::{AssetCache, GpuMesh, GpuProgram};
use nalgebra::{Matrix4, Rotation3, Vector2, Vector3};
use std::cell::Cell;
use std::sync::Arc;

/// A textured quad in the XY plane.
///
/// All sprites share the unit square mesh. Position, size and rotation are
/// folded into a model matrix that is only recomputed after a setter ran.
#[derive(Debug)]
pub struct SpriteDrawable {
    mesh: Arc<GpuMesh>,
    material: Material,
    program: Option<Arc<GpuProgram>>,

    position: Vector2<f32>,
    size: Vector2<f32>,
    rotation: f32,
    depth: f32,

    matrix: Cell<Matrix4<f32>>,
    dirty: Cell<bool>,
}

impl SpriteDrawable {
    pub fn new(assets: &AssetCache, material: Material) -> Result<Self> {
        let mesh = assets.mesh(&Geometry::new(UNIT_SQUARE_VERT.to_vec()))?;

        Ok(SpriteDrawable {
            mesh,
            material,
            program: None,
            position: Vector2::zeros(),
            size: Vector2::new(1.0, 1.0),
            rotation: 0.0,
            depth: 0.0,
            matrix: Cell::new(Matrix4::identity()),
            dirty: Cell::new(true),
        })
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.position = Vector2::new(x, y);
        self.dirty.set(true);
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.size = Vector2::new(width, height);
        self.dirty.set(true);
    }

    /// Counter-clockwise, in radians.
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.dirty.set(true);
    }

    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
        self.dirty.set(true);
    }

    pub fn set_program(&mut self, program: Option<Arc<GpuProgram>>) {
        self.program = program;
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    pub fn size(&self) -> Vector2<f32> {
        self.size
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }
}

impl Drawable for SpriteDrawable {
    fn mesh(&self) -> &Arc<GpuMesh> {
        &self.mesh
    }

    fn material(&self) -> &Material {
        &self.material
    }

    fn model_matrix(&self) -> Matrix4<f32> {
        if self.dirty.get() {
            let translation = Matrix4::new_translation(&Vector3::new(self.position.x, self.position.y, self.depth));
            let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), self.rotation).to_homogeneous();
            let scale = Matrix4::new_nonuniform_scaling(&Vector3::new(self.size.x, self.size.y, 1.0));

            self.matrix.set(translation * rotation * scale);
            self.dirty.set(false);
        }

        self.matrix.get()
    }

    fn program_override(&self) -> Option<&Arc<GpuProgram>> {
        self.program.as_ref()
    }
}
