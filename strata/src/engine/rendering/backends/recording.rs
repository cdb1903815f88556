//! A backend without a GPU.
//!
//! [`RecordingBackend`] hands out ids, tracks which resources are alive and
//! appends every call to a [`CallLog`]. The log is shared, so it stays
//! readable after the backend itself has been dropped together with its
//! [`GpuContext`](crate::rendering::GpuContext).

use crate::assets::{IndexWidth, ShaderStage};
use crate::error::*;
use crate::rendering::*;
use crate::utils::validate_wgsl_source;
use slotmap::SlotMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateVertexArray {
        array: ArrayId,
        vertices: usize,
        index_width: Option<IndexWidth>,
        index_bytes: usize,
    },
    DestroyVertexArray(ArrayId),
    CreateShader {
        id: ShaderId,
        stage: ShaderStage,
    },
    DestroyShader(ShaderId),
    CreateProgram {
        id: ProgramId,
        vertex: ShaderId,
        fragment: ShaderId,
    },
    DestroyProgram(ProgramId),
    CreateTexture {
        id: TextureId,
        width: u32,
        height: u32,
        layers: u32,
        array: bool,
    },
    DestroyTexture(TextureId),
    CreateFrameUniforms(UniformSetId),
    DestroyFrameUniforms(UniformSetId),
    SetViewport {
        width: u32,
        height: u32,
    },
    BindProgram(ProgramId),
    BindVertexArray(ArrayId),
    BindTexture {
        unit: u32,
        texture: TextureId,
    },
    WriteUniform {
        buffer: BufferId,
        offset: u64,
        size: usize,
    },
    Draw(DrawCall),
}

impl BackendCall {
    pub fn is_bind(&self) -> bool {
        matches!(
            self,
            BackendCall::BindProgram(_) | BackendCall::BindVertexArray(_) | BackendCall::BindTexture { .. }
        )
    }
}

/// Number of resources of each kind that were created and not destroyed yet.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct LiveResources {
    pub arrays: usize,
    pub buffers: usize,
    pub shaders: usize,
    pub programs: usize,
    pub textures: usize,
    pub uniform_sets: usize,
}

#[derive(Default)]
struct Resources {
    arrays: SlotMap<ArrayId, VertexArrayIds>,
    buffers: SlotMap<BufferId, u64>,
    shaders: SlotMap<ShaderId, ShaderStage>,
    programs: SlotMap<ProgramId, (ShaderId, ShaderId)>,
    textures: SlotMap<TextureId, bool>,
    uniform_sets: SlotMap<UniformSetId, FrameUniforms>,
}

#[derive(Default)]
struct Recorder {
    calls: Vec<BackendCall>,
    resources: Resources,
    /// Destroys of ids that were not alive, and uniform writes past the end of their buffer.
    misuses: usize,
}

/// Shared view of everything a [`RecordingBackend`] did.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Recorder>>);

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, Recorder> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, call: BackendCall) {
        trace!("{call:?}");
        self.lock().calls.push(call);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().calls.is_empty()
    }

    pub fn count(&self, filter: impl Fn(&BackendCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| filter(call)).count()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    /// Returns the recorded calls and clears the log.
    pub fn take(&self) -> Vec<BackendCall> {
        std::mem::take(&mut self.lock().calls)
    }

    pub fn live(&self) -> LiveResources {
        let recorder = self.lock();
        let resources = &recorder.resources;

        LiveResources {
            arrays: resources.arrays.len(),
            buffers: resources.buffers.len(),
            shaders: resources.shaders.len(),
            programs: resources.programs.len(),
            textures: resources.textures.len(),
            uniform_sets: resources.uniform_sets.len(),
        }
    }

    pub fn misuses(&self) -> usize {
        self.lock().misuses
    }
}

pub struct RecordingBackend {
    limits: BackendLimits,
    validate_shaders: bool,
    log: CallLog,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::with_limits(BackendLimits::default())
    }

    pub fn with_limits(limits: BackendLimits) -> Self {
        RecordingBackend {
            limits,
            validate_shaders: false,
            log: CallLog::default(),
        }
    }

    /// Parses and validates every shader as WGSL before accepting it.
    pub fn validating_shaders(mut self) -> Self {
        self.validate_shaders = true;
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "Recording"
    }

    fn limits(&self) -> BackendLimits {
        self.limits
    }

    fn create_vertex_array(&self, desc: &VertexArrayDesc) -> Result<VertexArrayIds> {
        let mut recorder = self.log.lock();
        let resources = &mut recorder.resources;

        let vertex_buffer = resources
            .buffers
            .insert(size_of_val(desc.vertices) as u64);
        let index_buffer = desc
            .indices
            .map(|(_, bytes)| resources.buffers.insert(bytes.len() as u64));

        let array = resources.arrays.insert_with_key(|array| VertexArrayIds {
            array,
            vertex_buffer,
            index_buffer,
        });
        let ids = VertexArrayIds {
            array,
            vertex_buffer,
            index_buffer,
        };

        recorder.calls.push(BackendCall::CreateVertexArray {
            array,
            vertices: desc.vertices.len(),
            index_width: desc.indices.map(|(width, _)| width),
            index_bytes: desc.indices.map_or(0, |(_, bytes)| bytes.len()),
        });

        Ok(ids)
    }

    fn destroy_vertex_array(&self, ids: VertexArrayIds) {
        let mut recorder = self.log.lock();
        let resources = &mut recorder.resources;

        let known = resources.arrays.remove(ids.array).is_some()
            & resources.buffers.remove(ids.vertex_buffer).is_some()
            & ids
                .index_buffer
                .is_none_or(|buffer| resources.buffers.remove(buffer).is_some());

        if !known {
            recorder.misuses += 1;
        }
        recorder.calls.push(BackendCall::DestroyVertexArray(ids.array));
    }

    fn create_shader(&self, stage: ShaderStage, source: &str, label: &str) -> Result<ShaderId> {
        if self.validate_shaders
            && let Err(e) = validate_wgsl_source(source)
        {
            return ShaderCompileErr {
                label,
                message: e.emit_to_string(source),
            }
            .fail();
        }

        let mut recorder = self.log.lock();
        let id = recorder.resources.shaders.insert(stage);
        recorder.calls.push(BackendCall::CreateShader { id, stage });

        Ok(id)
    }

    fn destroy_shader(&self, id: ShaderId) {
        let mut recorder = self.log.lock();
        if recorder.resources.shaders.remove(id).is_none() {
            recorder.misuses += 1;
        }
        recorder.calls.push(BackendCall::DestroyShader(id));
    }

    fn create_program(&self, vertex: ShaderId, fragment: ShaderId, label: &str) -> Result<ProgramId> {
        let mut recorder = self.log.lock();
        let resources = &mut recorder.resources;

        let stages = (resources.shaders.get(vertex), resources.shaders.get(fragment));
        if stages != (Some(&ShaderStage::Vertex), Some(&ShaderStage::Fragment)) {
            return ShaderCompileErr {
                label,
                message: "program stages must be a live vertex and a live fragment shader",
            }
            .fail();
        }

        let id = resources.programs.insert((vertex, fragment));
        recorder.calls.push(BackendCall::CreateProgram { id, vertex, fragment });

        Ok(id)
    }

    fn destroy_program(&self, id: ProgramId) {
        let mut recorder = self.log.lock();
        if recorder.resources.programs.remove(id).is_none() {
            recorder.misuses += 1;
        }
        recorder.calls.push(BackendCall::DestroyProgram(id));
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureId> {
        let expected = desc.width as usize * desc.height as usize * desc.layers as usize * 4;
        snafu::ensure!(
            desc.data.len() == expected,
            InvalidTextureDataErr {
                expected,
                actual: desc.data.len()
            }
        );

        let mut recorder = self.log.lock();
        let id = recorder.resources.textures.insert(desc.array);
        recorder.calls.push(BackendCall::CreateTexture {
            id,
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            array: desc.array,
        });

        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) {
        let mut recorder = self.log.lock();
        if recorder.resources.textures.remove(id).is_none() {
            recorder.misuses += 1;
        }
        recorder.calls.push(BackendCall::DestroyTexture(id));
    }

    fn create_frame_uniforms(&self, layout: &FrameUniformLayout) -> Result<FrameUniforms> {
        let mut recorder = self.log.lock();
        let resources = &mut recorder.resources;

        let camera = resources.buffers.insert(layout.camera_size);
        let transforms = resources.buffers.insert(layout.transform_size);
        let materials = resources.buffers.insert(layout.material_size);
        let id = resources.uniform_sets.insert_with_key(|id| FrameUniforms {
            id,
            camera,
            transforms,
            materials,
        });

        recorder.calls.push(BackendCall::CreateFrameUniforms(id));

        Ok(FrameUniforms {
            id,
            camera,
            transforms,
            materials,
        })
    }

    fn destroy_frame_uniforms(&self, uniforms: FrameUniforms) {
        let mut recorder = self.log.lock();
        let resources = &mut recorder.resources;

        let known = resources.uniform_sets.remove(uniforms.id).is_some()
            & resources.buffers.remove(uniforms.camera).is_some()
            & resources.buffers.remove(uniforms.transforms).is_some()
            & resources.buffers.remove(uniforms.materials).is_some();

        if !known {
            recorder.misuses += 1;
        }
        recorder.calls.push(BackendCall::DestroyFrameUniforms(uniforms.id));
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.log.push(BackendCall::SetViewport { width, height });
    }

    fn bind_program(&self, id: ProgramId) {
        self.log.push(BackendCall::BindProgram(id));
    }

    fn bind_vertex_array(&self, id: ArrayId) {
        self.log.push(BackendCall::BindVertexArray(id));
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        self.log.push(BackendCall::BindTexture { unit, texture });
    }

    fn write_uniform(&self, buffer: BufferId, offset: u64, data: &[u8]) {
        let mut recorder = self.log.lock();

        let fits = recorder
            .resources
            .buffers
            .get(buffer)
            .is_some_and(|size| offset + data.len() as u64 <= *size);
        if !fits {
            recorder.misuses += 1;
        }

        recorder.calls.push(BackendCall::WriteUniform {
            buffer,
            offset,
            size: data.len(),
        });
    }

    fn draw(&self, call: &DrawCall) {
        self.log.push(BackendCall::Draw(*call));
    }
}
