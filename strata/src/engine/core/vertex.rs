use crate::utils::sizes::{VEC2_SIZE, VEC3_SIZE, vertex_layout_size};
use nalgebra::{Vector2, Vector3};
use static_assertions::const_assert_eq;
use wgpu::{BufferAddress, VertexAttribute, VertexFormat};

/// A single geometry vertex as it is uploaded to the GPU.
///
/// The byte layout of this struct is also what the content hash is computed
/// over, so two meshes only deduplicate if their vertices are bit-identical.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: Vector3<f32>,
    pub tex_coord: Vector2<f32>,
}

impl Vertex3D {
    pub const fn new(position: Vector3<f32>, tex_coord: Vector2<f32>) -> Self {
        Vertex3D {
            position,
            tex_coord,
        }
    }

    pub const fn basic(x: f32, y: f32, z: f32, u: f32, v: f32) -> Self {
        Vertex3D {
            position: Vector3::new(x, y, z),
            tex_coord: Vector2::new(u, v),
        }
    }

    pub const fn continuous_descriptor<'a>() -> wgpu::VertexBufferLayout<'a> {
        const LAYOUT: wgpu::VertexBufferLayout = wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex3D>() as BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                VertexAttribute {
                    format: VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                },
                VertexAttribute {
                    format: VertexFormat::Float32x2,
                    offset: VEC3_SIZE,
                    shader_location: 1,
                },
            ],
        };

        const_assert_eq!(size_of::<Vertex3D>(), vertex_layout_size(&LAYOUT));
        const_assert_eq!(size_of::<Vertex3D>() as u64, VEC3_SIZE + VEC2_SIZE);

        LAYOUT
    }
}

pub const UNIT_SQUARE_VERT: [Vertex3D; 6] = [
    Vertex3D::basic(-1.0, -1.0, 0.0, 0.0, 1.0),
    Vertex3D::basic(1.0, -1.0, 0.0, 1.0, 1.0),
    Vertex3D::basic(1.0, 1.0, 0.0, 1.0, 0.0),
    Vertex3D::basic(-1.0, -1.0, 0.0, 0.0, 1.0),
    Vertex3D::basic(1.0, 1.0, 0.0, 1.0, 0.0),
    Vertex3D::basic(-1.0, 1.0, 0.0, 0.0, 0.0),
];
