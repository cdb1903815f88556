//! [`RenderBackend`] on top of wgpu.
//!
//! Resources are created right away. Binds and draws are recorded into a
//! command list and replayed into a [`RenderPass`] by [`WgpuBackend::encode`],
//! or into a freshly begun pass on a target view by [`WgpuBackend::render_to`].
//! Uniform writes go straight to the queue, which applies them before the next
//! submission.

mod layouts;
mod uniform;

pub use layouts::WgpuTargets;
pub use uniform::*;

use crate::assets::{IndexWidth, ShaderStage};
use crate::error::*;
use crate::rendering::uniform::FrameUniformIndex;
use crate::rendering::*;
use crate::utils::validate_wgsl_source;
use layouts::{Layouts, VERTEX_BUFFERS, color_targets, depth_stencil};
use slotmap::SlotMap;
use std::borrow::Cow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use wgpu::util::{BufferInitDescriptor, DeviceExt, TextureDataOrder};
use wgpu::*;

struct GpuArray {
    vertex: BufferId,
    index: Option<(BufferId, IndexFormat)>,
}

#[derive(Default)]
struct Resources {
    arrays: SlotMap<ArrayId, GpuArray>,
    buffers: SlotMap<BufferId, Buffer>,
    shaders: SlotMap<ShaderId, (ShaderStage, ShaderModule)>,
    programs: SlotMap<ProgramId, RenderPipeline>,
    textures: SlotMap<TextureId, BindGroup>,
    uniform_sets: SlotMap<UniformSetId, ShaderUniform<FrameUniformIndex>>,
}

#[derive(Debug, Copy, Clone)]
enum Command {
    Viewport(u32, u32),
    Program(ProgramId),
    Array(ArrayId),
    Texture(u32, TextureId),
    Draw(DrawCall),
}

pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    targets: WgpuTargets,
    limits: BackendLimits,
    layouts: Layouts,
    sampler: Sampler,
    resources: Mutex<Resources>,
    commands: Mutex<Vec<Command>>,
}

impl WgpuBackend {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>, targets: WgpuTargets) -> Self {
        let device_limits = device.limits();
        let limits = BackendLimits {
            uniform_offset_alignment: device_limits.min_uniform_buffer_offset_alignment,
            max_texture_array_layers: device_limits.max_texture_array_layers,
            supports_u8_indices: false,
        };

        let layouts = Layouts::new(&device);
        let sampler = device.create_sampler(&SamplerDescriptor {
            label: Some("Default Sampler"),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..SamplerDescriptor::default()
        });

        WgpuBackend {
            device,
            queue,
            targets,
            limits,
            layouts,
            sampler,
            resources: Mutex::default(),
            commands: Mutex::default(),
        }
    }

    /// Picks the default adapter and creates a device without a surface.
    pub fn new_headless(targets: WgpuTargets) -> Result<Self> {
        let instance = Instance::new(&InstanceDescriptor::default());

        let adapter = futures::executor::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| RenderError::Backend {
            message: format!("No adapter available: {e}"),
        })?;

        let info = adapter.get_info();
        debug!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = futures::executor::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("Strata Device"),
            ..DeviceDescriptor::default()
        }))
        .map_err(|e| RenderError::Backend {
            message: format!("Device request failed: {e}"),
        })?;

        Ok(Self::new(Arc::new(device), Arc::new(queue), targets))
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    fn resources(&self) -> MutexGuard<'_, Resources> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, command: Command) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    /// Replays every recorded bind and draw into `pass` and clears the recording.
    ///
    /// Call this before the renderer begins its next frame, which releases the
    /// meshes of the flushed draws. Draws whose program, textures or vertex
    /// array were destroyed in the meantime are skipped.
    pub fn encode(&self, pass: &mut RenderPass) {
        let commands = std::mem::take(&mut *self.commands.lock().unwrap_or_else(PoisonError::into_inner));
        let resources = self.resources();

        let mut index_format = None;
        let mut program_bound = false;
        let mut array_bound = false;
        let mut textures_bound = [false; 2];
        let mut skipped = 0usize;

        for command in commands {
            match command {
                Command::Viewport(width, height) => {
                    pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
                }
                Command::Program(id) => {
                    program_bound = match resources.programs.get(id) {
                        Some(pipeline) => {
                            pass.set_pipeline(pipeline);
                            true
                        }
                        None => false,
                    };
                }
                Command::Texture(unit, id) => {
                    let bind_group = resources.textures.get(id);
                    if let Some(bind_group) = bind_group {
                        pass.set_bind_group(1 + unit, bind_group, &[]);
                    }
                    if let Some(bound) = textures_bound.get_mut(unit as usize) {
                        *bound = bind_group.is_some();
                    }
                }
                Command::Array(id) => {
                    index_format = None;
                    array_bound = false;

                    let Some(array) = resources.arrays.get(id) else {
                        continue;
                    };
                    let Some(vertices) = resources.buffers.get(array.vertex) else {
                        continue;
                    };

                    pass.set_vertex_buffer(0, vertices.slice(..));
                    array_bound = true;

                    if let Some((buffer, format)) = array.index
                        && let Some(indices) = resources.buffers.get(buffer)
                    {
                        pass.set_index_buffer(indices.slice(..), format);
                        index_format = Some(format);
                    }
                }
                Command::Draw(call) => {
                    let ready = program_bound && array_bound && textures_bound.iter().all(|bound| *bound);
                    let Some(uniforms) = resources.uniform_sets.get(call.uniforms).filter(|_| ready) else {
                        skipped += 1;
                        continue;
                    };

                    pass.set_bind_group(
                        0,
                        uniforms.bind_group(),
                        &[call.camera_offset, call.transform_offset, call.material_offset],
                    );

                    if call.index_count > 0 && index_format.is_some() {
                        pass.draw_indexed(0..call.index_count, 0, 0..1);
                    } else {
                        pass.draw(0..call.vertex_count, 0..1);
                    }
                }
            }
        }

        if skipped > 0 {
            warn!("Skipped {skipped} draws whose resources were destroyed before encoding");
        }
    }

    /// Begins a pass on `view`, replays the recording and submits it.
    pub fn render_to(&self, view: &TextureView, depth: Option<&TextureView>, clear: Color) {
        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("Strata Frame Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Strata Frame Pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(clear),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: depth.map(|view| RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.encode(&mut pass);
        }

        self.queue.submit(Some(encoder.finish()));
    }
}

impl RenderBackend for WgpuBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn limits(&self) -> BackendLimits {
        self.limits
    }

    fn create_vertex_array(&self, desc: &VertexArrayDesc) -> Result<VertexArrayIds> {
        let vertex_buffer = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", desc.label)),
            contents: bytemuck::cast_slice(desc.vertices),
            usage: BufferUsages::VERTEX,
        });

        let index_buffer = match desc.indices {
            None => None,
            Some((IndexWidth::U8, _)) => {
                return BackendErr {
                    message: "wgpu has no 8-bit index format",
                }
                .fail();
            }
            Some((width, data)) => {
                let format = match width {
                    IndexWidth::U16 => IndexFormat::Uint16,
                    _ => IndexFormat::Uint32,
                };

                let buffer = self.device.create_buffer_init(&BufferInitDescriptor {
                    label: Some(&format!("{} Index Buffer", desc.label)),
                    contents: data,
                    usage: BufferUsages::INDEX,
                });
                Some((buffer, format))
            }
        };

        let mut resources = self.resources();
        let vertex = resources.buffers.insert(vertex_buffer);
        let index = index_buffer.map(|(buffer, format)| (resources.buffers.insert(buffer), format));
        let array = resources.arrays.insert(GpuArray { vertex, index });

        Ok(VertexArrayIds {
            array,
            vertex_buffer: vertex,
            index_buffer: index.map(|(buffer, _)| buffer),
        })
    }

    fn destroy_vertex_array(&self, ids: VertexArrayIds) {
        let mut resources = self.resources();
        resources.arrays.remove(ids.array);

        for buffer in std::iter::once(ids.vertex_buffer).chain(ids.index_buffer) {
            if let Some(buffer) = resources.buffers.remove(buffer) {
                buffer.destroy();
            }
        }
    }

    fn create_shader(&self, stage: ShaderStage, source: &str, label: &str) -> Result<ShaderId> {
        if let Err(e) = validate_wgsl_source(source) {
            return ShaderCompileErr {
                label,
                message: e.emit_to_string(source),
            }
            .fail();
        }

        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(source)),
        });

        Ok(self.resources().shaders.insert((stage, module)))
    }

    fn destroy_shader(&self, id: ShaderId) {
        self.resources().shaders.remove(id);
    }

    fn create_program(&self, vertex: ShaderId, fragment: ShaderId, label: &str) -> Result<ProgramId> {
        let mut resources = self.resources();

        let (Some((ShaderStage::Vertex, vs)), Some((ShaderStage::Fragment, fs))) =
            (resources.shaders.get(vertex), resources.shaders.get(fragment))
        else {
            return ShaderCompileErr {
                label,
                message: "program stages must be a live vertex and a live fragment shader",
            }
            .fail();
        };

        let targets = color_targets(&self.targets);
        let pipeline = self.device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&self.layouts.pipeline),
            vertex: VertexState {
                module: vs,
                entry_point: Some(ShaderStage::Vertex.entry_point()),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &VERTEX_BUFFERS,
            },
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..PrimitiveState::default()
            },
            depth_stencil: depth_stencil(&self.targets),
            multisample: MultisampleState::default(),
            fragment: Some(FragmentState {
                module: fs,
                entry_point: Some(ShaderStage::Fragment.entry_point()),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &targets,
            }),
            multiview: None,
            cache: None,
        });

        Ok(resources.programs.insert(pipeline))
    }

    fn destroy_program(&self, id: ProgramId) {
        self.resources().programs.remove(id);
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

        let texture = self.device.create_texture_with_data(
            &self.queue,
            &TextureDescriptor {
                label: Some(desc.label),
                size: Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: desc.layers,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: TextureDimension::D2,
                format: TextureFormat::Rgba8UnormSrgb,
                usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
                view_formats: &[],
            },
            TextureDataOrder::LayerMajor,
            desc.data,
        );

        let (dimension, layout) = match desc.array {
            true => (TextureViewDimension::D2Array, &self.layouts.layered),
            false => (TextureViewDimension::D2, &self.layouts.diffuse),
        };

        let view = texture.create_view(&TextureViewDescriptor {
            label: Some(desc.label),
            dimension: Some(dimension),
            ..TextureViewDescriptor::default()
        });

        let uniform = ShaderUniform::<TextureUniformIndex>::builder(layout)
            .with_texture_view(&view)
            .with_sampler(&self.sampler)
            .build(&self.device);

        Ok(self.resources().textures.insert(uniform.bind_group().clone()))
    }

    fn destroy_texture(&self, id: TextureId) {
        self.resources().textures.remove(id);
    }

    fn create_frame_uniforms(&self, layout: &FrameUniformLayout) -> Result<FrameUniforms> {
        let uniform = ShaderUniform::<FrameUniformIndex>::builder(&self.layouts.frame)
            .with_ring_buffer(layout.camera_size, layout.camera_block)
            .with_ring_buffer(layout.transform_size, layout.transform_block)
            .with_ring_buffer(layout.material_size, layout.material_block)
            .build(&self.device);

        let buffer = |index| {
            uniform.buffer(index).cloned().ok_or(RenderError::Backend {
                message: format!("Frame uniform {index:?} has no buffer"),
            })
        };
        let camera = buffer(FrameUniformIndex::Camera)?;
        let transforms = buffer(FrameUniformIndex::Transform)?;
        let materials = buffer(FrameUniformIndex::Material)?;

        let mut resources = self.resources();
        let camera = resources.buffers.insert(camera);
        let transforms = resources.buffers.insert(transforms);
        let materials = resources.buffers.insert(materials);
        let id = resources.uniform_sets.insert(uniform);

        Ok(FrameUniforms {
            id,
            camera,
            transforms,
            materials,
        })
    }

    fn destroy_frame_uniforms(&self, uniforms: FrameUniforms) {
        let mut resources = self.resources();
        resources.uniform_sets.remove(uniforms.id);

        for buffer in [uniforms.camera, uniforms.transforms, uniforms.materials] {
            if let Some(buffer) = resources.buffers.remove(buffer) {
                buffer.destroy();
            }
        }
    }

    fn set_viewport(&self, width: u32, height: u32) {
        self.record(Command::Viewport(width, height));
    }

    fn bind_program(&self, id: ProgramId) {
        self.record(Command::Program(id));
    }

    fn bind_vertex_array(&self, id: ArrayId) {
        self.record(Command::Array(id));
    }

    fn bind_texture(&self, unit: u32, id: TextureId) {
        self.record(Command::Texture(unit, id));
    }

    fn write_uniform(&self, buffer: BufferId, offset: u64, data: &[u8]) {
        match self.resources().buffers.get(buffer) {
            Some(target) => self.queue.write_buffer(target, offset, data),
            None => warn!("Uniform write to a buffer that does not exist anymore"),
        }
    }

    fn draw(&self, call: &DrawCall) {
        self.record(Command::Draw(*call));
    }
}
