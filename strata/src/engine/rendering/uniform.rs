use crate::ensure_aligned;
use crate::rendering::{FrameUniformLayout, RenderConfig};
use crate::utils::align_up;
use nalgebra::{Matrix4, Vector4};
use strata_macros::UniformIndex;

/// Bindings of the per-frame bind group, in binding order.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, UniformIndex)]
pub enum FrameUniformIndex {
    Camera = 0,
    Transform = 1,
    Material = 2,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub proj_view: Matrix4<f32>,
}

impl CameraUniform {
    pub fn new(view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        CameraUniform {
            view,
            projection,
            proj_view: projection * view,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: Matrix4<f32>,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: Vector4<f32>,
    /// x: mix amount, y: array layer, zw: unused
    pub params: Vector4<f32>,
}

ensure_aligned!(CameraUniform);
ensure_aligned!(TransformUniform);
ensure_aligned!(MaterialUniform);

impl MaterialUniform {
    pub fn new(color: Vector4<f32>, mix: f32, layer: u32) -> Self {
        MaterialUniform {
            color,
            params: Vector4::new(mix, layer as f32, 0.0, 0.0),
        }
    }

    #[inline]
    pub fn mix(&self) -> f32 {
        self.params.x
    }

    #[inline]
    pub fn layer(&self) -> f32 {
        self.params.y
    }

    /// Whether any component differs from `other` by more than `epsilon`.
    pub fn differs(&self, other: &MaterialUniform, epsilon: f32) -> bool {
        self.color
            .iter()
            .chain(self.params.iter())
            .zip(other.color.iter().chain(other.params.iter()))
            .any(|(a, b)| (a - b).abs() > epsilon)
    }
}

/// Buffer sizes for the three uniform regions, with every block padded to `alignment`.
///
/// The camera gets one block per frame in flight, transforms get `max_draws`
/// blocks per frame, materials `max_material_changes` blocks per frame.
pub fn frame_uniform_layout(config: &RenderConfig, alignment: u64) -> FrameUniformLayout {
    let frames = u64::from(config.frames_in_flight);

    let camera_block = align_up(size_of::<CameraUniform>() as u64, alignment);
    let transform_block = align_up(size_of::<TransformUniform>() as u64, alignment);
    let material_block = align_up(size_of::<MaterialUniform>() as u64, alignment);

    FrameUniformLayout {
        camera_block,
        camera_size: frames * camera_block,
        transform_block,
        transform_size: frames * u64::from(config.max_draws) * transform_block,
        material_block,
        material_size: frames * u64::from(config.material_capacity()) * material_block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_change_detection_uses_epsilon() {
        let base = MaterialUniform::new(Vector4::new(1.0, 1.0, 1.0, 1.0), 0.5, 2);
        let close = MaterialUniform::new(Vector4::new(1.0, 0.9995, 1.0, 1.0), 0.5, 2);
        let other_layer = MaterialUniform::new(Vector4::new(1.0, 1.0, 1.0, 1.0), 0.5, 3);

        assert!(!base.differs(&close, 0.001));
        assert!(base.differs(&other_layer, 0.001));
    }
}
