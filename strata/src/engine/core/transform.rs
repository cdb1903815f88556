use nalgebra::{Matrix4, Translation3, UnitQuaternion, Vector3};
use std::cell::Cell;

/// Stores the translation, rotation and scale of a drawable.
///
/// The compound model matrix is memoized: every setter only flags the transform
/// as dirty and the matrix is rebuilt the next time it is read.
#[derive(Debug, Clone)]
pub struct Transform {
    pos: Vector3<f32>,
    rot: UnitQuaternion<f32>,
    scale: Vector3<f32>,
    compound_mat: Cell<Matrix4<f32>>,
    dirty: Cell<bool>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Creates a transform at the origin with no rotation and a uniform scale of `1.0`.
    pub fn new() -> Self {
        Transform {
            pos: Vector3::zeros(),
            rot: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            compound_mat: Cell::new(Matrix4::identity()),
            dirty: Cell::new(false),
        }
    }

    #[inline(always)]
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.set_position_vec(Vector3::new(x, y, z))
    }

    pub fn set_position_vec(&mut self, pos: Vector3<f32>) {
        self.pos = pos;
        self.dirty.set(true);
    }

    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.set_position_vec(self.pos + delta);
    }

    pub fn position(&self) -> Vector3<f32> {
        self.pos
    }

    pub fn set_rotation(&mut self, rot: UnitQuaternion<f32>) {
        self.rot = rot;
        self.dirty.set(true);
    }

    pub fn set_euler_rotation(&mut self, roll: f32, pitch: f32, yaw: f32) {
        self.set_rotation(UnitQuaternion::from_euler_angles(roll, pitch, yaw));
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rot
    }

    #[inline(always)]
    pub fn set_scale(&mut self, x: f32, y: f32, z: f32) {
        self.set_nonuniform_scale_vec(Vector3::new(x, y, z));
    }

    pub fn set_uniform_scale(&mut self, factor: f32) {
        self.set_nonuniform_scale_vec(Vector3::new(factor, factor, factor));
    }

    pub fn set_nonuniform_scale_vec(&mut self, scale: Vector3<f32>) {
        self.scale = scale;
        self.dirty.set(true);
    }

    pub fn scale(&self) -> Vector3<f32> {
        self.scale
    }

    /// Whether the next [`Transform::model_matrix`] call has to rebuild the matrix.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Returns `translation * rotation * scale`, rebuilding it if a setter ran since the last read.
    pub fn model_matrix(&self) -> Matrix4<f32> {
        if self.dirty.replace(false) {
            self.compound_mat.set(self.compose());
        }
        self.compound_mat.get()
    }

    fn compose(&self) -> Matrix4<f32> {
        Translation3::from(self.pos).to_homogeneous()
            * self.rot.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}
