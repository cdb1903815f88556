use nalgebra::{Matrix4, Vector2, Vector3, Vector4};
use static_assertions::const_assert_eq;

pub const VEC2_SIZE: u64 = size_of::<Vector2<f32>>() as u64;
pub const VEC3_SIZE: u64 = size_of::<Vector3<f32>>() as u64;
pub const VEC4_SIZE: u64 = size_of::<Vector4<f32>>() as u64;
pub const MAT4_SIZE: u64 = size_of::<Matrix4<f32>>() as u64;

pub const WGPU_VEC2_ALIGN: u64 = 8;
pub const WGPU_VEC4_ALIGN: u64 = 16;

/// The minimum offset alignment for dynamic uniform buffer bindings that
/// every wgpu adapter guarantees.
pub const WGPU_UNIFORM_OFFSET_ALIGN: u64 = 256;

const_assert_eq!(VEC2_SIZE, WGPU_VEC2_ALIGN);
const_assert_eq!(VEC3_SIZE + 4, WGPU_VEC4_ALIGN);
const_assert_eq!(VEC4_SIZE, WGPU_VEC4_ALIGN);
const_assert_eq!(MAT4_SIZE, 4 * WGPU_VEC4_ALIGN);

pub const fn vertex_layout_size(layout: &wgpu::VertexBufferLayout) -> usize {
    let mut sum: u64 = 0;
    let mut i = 0;

    while i < layout.attributes.len() {
        sum += layout.attributes[i].format.size();
        i += 1;
    }

    sum as usize
}

/// Rounds `size` up to the next multiple of `align`. An alignment of zero
/// leaves the size untouched.
#[inline]
pub const fn align_up(size: u64, align: u64) -> u64 {
    if align == 0 {
        return size;
    }
    size.div_ceil(align) * align
}

/// Fails compilation if a uniform block is not a whole number of `vec4`s.
#[macro_export]
macro_rules! ensure_aligned {
    ($ty:ty) => {
        ::static_assertions::const_assert_eq!(
            size_of::<$ty>() as u64 % $crate::utils::sizes::WGPU_VEC4_ALIGN,
            0
        );
    };
}
