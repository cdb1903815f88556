//! The seam between the engine and the graphics API.
//!
//! Caches, the renderer and the material binder only ever talk to a
//! [`RenderBackend`]. All methods take `&self`, backends keep their mutable
//! state behind their own locks.

use crate::assets::{IndexWidth, ShaderStage};
use crate::engine::core::Vertex3D;
use crate::error::Result;
use crate::utils::WGPU_UNIFORM_OFFSET_ALIGN;
use slotmap::new_key_type;

new_key_type! {
    /// An array descriptor, binding a vertex buffer (and an index buffer) to the vertex layout.
    pub struct ArrayId;
    pub struct BufferId;
    pub struct ShaderId;
    pub struct ProgramId;
    pub struct TextureId;
    /// A set of frame uniform buffers created by [`RenderBackend::create_frame_uniforms`].
    pub struct UniformSetId;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BackendLimits {
    /// Offsets passed to [`DrawCall`] must be multiples of this.
    pub uniform_offset_alignment: u32,
    pub max_texture_array_layers: u32,
    pub supports_u8_indices: bool,
}

impl Default for BackendLimits {
    fn default() -> Self {
        BackendLimits {
            uniform_offset_alignment: WGPU_UNIFORM_OFFSET_ALIGN as u32,
            max_texture_array_layers: 256,
            supports_u8_indices: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VertexArrayDesc<'a> {
    pub label: &'a str,
    pub vertices: &'a [Vertex3D],
    pub indices: Option<(IndexWidth, &'a [u8])>,
}

/// The GPU object triple behind a mesh.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexArrayIds {
    pub array: ArrayId,
    pub vertex_buffer: BufferId,
    pub index_buffer: Option<BufferId>,
}

#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
    /// Sampled as an array texture, even with a single layer.
    pub array: bool,
    /// Tightly packed RGBA8 rows, layer after layer.
    pub data: &'a [u8],
}

/// Byte sizes of the three ring-buffered uniform regions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameUniformLayout {
    pub camera_block: u64,
    pub camera_size: u64,
    pub transform_block: u64,
    pub transform_size: u64,
    pub material_block: u64,
    pub material_size: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameUniforms {
    pub id: UniformSetId,
    pub camera: BufferId,
    pub transforms: BufferId,
    pub materials: BufferId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub uniforms: UniformSetId,
    pub camera_offset: u32,
    pub transform_offset: u32,
    pub material_offset: u32,
    pub vertex_count: u32,
    /// Zero draws the vertices without indices.
    pub index_count: u32,
}

pub trait RenderBackend: Send + Sync {
    fn name(&self) -> &str;
    fn limits(&self) -> BackendLimits;

    fn create_vertex_array(&self, desc: &VertexArrayDesc) -> Result<VertexArrayIds>;
    fn destroy_vertex_array(&self, ids: VertexArrayIds);

    fn create_shader(&self, stage: ShaderStage, source: &str, label: &str) -> Result<ShaderId>;
    fn destroy_shader(&self, id: ShaderId);

    fn create_program(&self, vertex: ShaderId, fragment: ShaderId, label: &str) -> Result<ProgramId>;
    fn destroy_program(&self, id: ProgramId);

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureId>;
    fn destroy_texture(&self, id: TextureId);

    fn create_frame_uniforms(&self, layout: &FrameUniformLayout) -> Result<FrameUniforms>;
    fn destroy_frame_uniforms(&self, uniforms: FrameUniforms);

    fn set_viewport(&self, width: u32, height: u32);
    fn bind_program(&self, id: ProgramId);
    fn bind_vertex_array(&self, id: ArrayId);
    fn bind_texture(&self, unit: u32, id: TextureId);
    fn write_uniform(&self, buffer: BufferId, offset: u64, data: &[u8]);
    fn draw(&self, call: &DrawCall);
}
