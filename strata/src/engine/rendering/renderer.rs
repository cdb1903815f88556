//! Per-frame draw submission.
//!
//! A frame starts with [`Renderer::begin_frame`], which forgets everything
//! that was bound before and moves the uniform rings to the next slot.
//! Drawables are queued with [`Renderer::submit`] or
//! [`Renderer::submit_list`] and sent to the backend by [`Renderer::flush`].
//!
//! Flushing compares what each draw needs with what is bound and only issues
//! the binds that differ, most expensive first: program, textures, vertex
//! array, material uniform. The transform is written for every draw.

use crate::assets::Material;
use crate::drawables::Drawable;
use crate::error::*;
use crate::rendering::cache::{AssetCache, GpuMesh, GpuProgram, GpuTexture};
use crate::rendering::material_binding::MaterialBinder;
use crate::rendering::ring_buffer::UniformRing;
use crate::rendering::state::{DIFFUSE_UNIT, LAYERED_UNIT, StateCache};
use crate::rendering::uniform::{CameraUniform, TransformUniform, frame_uniform_layout};
use crate::rendering::{DrawCall, FrameUniformLayout, FrameUniforms, GpuContext, RenderConfig};
use crate::scene::DrawList;
use nalgebra::Matrix4;
use snafu::{OptionExt, ensure};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, trace};

/// Supplies the camera matrices for a frame.
pub trait CameraSource {
    fn view_matrix(&self) -> Matrix4<f32>;
    fn projection_matrix(&self) -> Matrix4<f32>;
}

/// Supplies the size of the surface that is drawn to.
pub trait FramebufferSource {
    fn framebuffer_size(&self) -> (u32, u32);
}

impl CameraSource for CameraUniform {
    fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }
}

impl FramebufferSource for (u32, u32) {
    fn framebuffer_size(&self) -> (u32, u32) {
        *self
    }
}

/// What happened during a frame, accumulated over all flushes since `begin_frame`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: u32,
    pub program_binds: u32,
    pub texture_binds: u32,
    pub array_binds: u32,
    pub camera_writes: u32,
    pub transform_writes: u32,
    pub material_writes: u32,
}

impl FrameStats {
    pub fn uniform_writes(&self) -> u32 {
        self.camera_writes + self.transform_writes + self.material_writes
    }
}

/// A queued draw. Holds on to its resources until the frame after it was
/// flushed begins, so backends that replay draws later still find them.
#[derive(Debug, Clone)]
struct DrawCommand {
    mesh: Arc<GpuMesh>,
    program: Option<Arc<GpuProgram>>,
    material: Material,
    model: Matrix4<f32>,
}

pub struct Renderer {
    ctx: GpuContext,
    config: RenderConfig,

    uniforms: FrameUniforms,
    layout: FrameUniformLayout,
    transforms: UniformRing,
    materials: UniformRing,

    default_program: Arc<GpuProgram>,
    default_texture: Arc<GpuTexture>,
    default_texture_array: Arc<GpuTexture>,

    state: StateCache,
    binder: MaterialBinder,
    queue: Vec<DrawCommand>,
    issued: Vec<DrawCommand>,

    frame_counter: u64,
    frame_index: u32,
    in_frame: bool,
    camera_written: bool,
    stats: FrameStats,
}

impl Renderer {
    pub fn new(assets: &AssetCache, config: RenderConfig) -> Result<Self> {
        config.validate()?;

        let ctx = assets.context().clone();
        let alignment = u64::from(ctx.limits().uniform_offset_alignment);
        let layout = frame_uniform_layout(&config, alignment);
        ensure!(
            [layout.camera_size, layout.transform_size, layout.material_size]
                .into_iter()
                .all(|size| size <= u64::from(u32::MAX)),
            InvalidConfigErr {
                reason: "uniform regions must be addressable with 32-bit offsets"
            }
        );
        let uniforms = ctx.backend().create_frame_uniforms(&layout)?;

        let transforms = UniformRing::new(
            uniforms.transforms,
            layout.transform_block,
            config.max_draws,
            config.frames_in_flight,
        );
        let materials = UniformRing::new(
            uniforms.materials,
            layout.material_block,
            config.material_capacity(),
            config.frames_in_flight,
        );

        let default_texture = assets.default_texture().clone();
        let default_texture_array = assets.default_texture_array().clone();
        let binder = MaterialBinder::new(
            default_texture.id(),
            default_texture_array.id(),
            config.material_epsilon,
        );

        debug!(
            "Renderer created with {} frames in flight and {} draws per frame",
            config.frames_in_flight, config.max_draws
        );

        Ok(Renderer {
            ctx,
            config,
            uniforms,
            layout,
            transforms,
            materials,
            default_program: assets.default_program().clone(),
            default_texture,
            default_texture_array,
            state: StateCache::default(),
            binder,
            queue: Vec::new(),
            issued: Vec::new(),
            frame_counter: 0,
            frame_index: 0,
            in_frame: false,
            camera_written: false,
            stats: FrameStats::default(),
        })
    }

    /// Starts a new frame.
    ///
    /// Drops anything still queued, forgets the bound state and moves to the
    /// next uniform slot. The viewport is set to the framebuffer size.
    pub fn begin_frame(&mut self, framebuffer: &dyn FramebufferSource) {
        if !self.queue.is_empty() {
            debug!("Discarding {} draws that were never flushed", self.queue.len());
        }
        self.queue.clear();
        self.issued.clear();

        self.state.reset();
        self.binder.reset();

        self.frame_index = (self.frame_counter % u64::from(self.config.frames_in_flight)) as u32;
        self.frame_counter += 1;
        self.transforms.begin_frame(self.frame_index);
        self.materials.begin_frame(self.frame_index);

        self.in_frame = true;
        self.camera_written = false;
        self.stats = FrameStats::default();

        let (width, height) = framebuffer.framebuffer_size();
        self.ctx.backend().set_viewport(width, height);

        trace!("Began frame {} in slot {}", self.frame_counter, self.frame_index);
    }

    /// Writes the camera block of this frame. Only the first call per frame
    /// writes, later ones return `false`.
    pub fn set_camera(&mut self, camera: &dyn CameraSource) -> Result<bool> {
        ensure!(self.in_frame, FrameNotStartedErr);

        if self.camera_written {
            return Ok(false);
        }

        let uniform = CameraUniform::new(camera.view_matrix(), camera.projection_matrix());
        self.ctx.backend().write_uniform(
            self.uniforms.camera,
            self.camera_offset(),
            bytemuck::bytes_of(&uniform),
        );

        self.camera_written = true;
        self.stats.camera_writes += 1;

        Ok(true)
    }

    /// Queues a single drawable.
    pub fn submit(&mut self, drawable: &dyn Drawable) -> Result<()> {
        ensure!(self.in_frame, FrameNotStartedErr);

        self.queue.push(DrawCommand {
            mesh: drawable.mesh().clone(),
            program: drawable.program_override().cloned(),
            material: drawable.material().clone(),
            model: drawable.model_matrix(),
        });

        Ok(())
    }

    /// Queues every drawable of the list in its order and returns how many there were.
    pub fn submit_list<K: Eq + Hash + Clone + Debug>(&mut self, list: &DrawList<K>) -> Result<usize> {
        ensure!(self.in_frame, FrameNotStartedErr);

        self.queue.reserve(list.len());
        for (_, drawable) in list.iter() {
            self.submit(drawable)?;
        }

        Ok(list.len())
    }

    /// Sends all queued draws to the backend in submission order.
    ///
    /// Fails with `UniformOverflow` once a ring slot is full. The draws issued
    /// before that stay issued, the rest of the queue is dropped.
    pub fn flush(&mut self) -> Result<FrameStats> {
        ensure!(self.in_frame, FrameNotStartedErr);

        let mut queue = std::mem::take(&mut self.queue);
        let result = queue.drain(..).try_for_each(|command| -> Result<()> {
            self.issue(&command)?;
            self.issued.push(command);
            Ok(())
        });

        // keep the allocation for the next frame
        self.queue = queue;
        result?;

        Ok(self.stats)
    }

    fn issue(&mut self, command: &DrawCommand) -> Result<()> {
        let backend = self.ctx.backend();

        let program = command
            .program
            .as_ref()
            .unwrap_or(&self.default_program)
            .id();
        if self.state.bind_program(program) {
            backend.bind_program(program);
            self.stats.program_binds += 1;
        }

        let material = self.binder.resolve(&command.material);
        for (unit, texture) in [(DIFFUSE_UNIT, material.diffuse), (LAYERED_UNIT, material.layered)] {
            if self.state.bind_texture(unit, texture) {
                backend.bind_texture(unit, texture);
                self.stats.texture_binds += 1;
            }
        }

        let array = command.mesh.array();
        if self.state.bind_array(array) {
            backend.bind_vertex_array(array);
            self.stats.array_binds += 1;
        }

        if self.binder.update(&material.uniform) {
            self.materials
                .push(backend, bytemuck::bytes_of(&material.uniform))?;
            self.stats.material_writes += 1;
        }
        let material_offset = self.materials.last_offset().unwrap_or_default();

        let transform = TransformUniform { model: command.model };
        let transform_offset = self
            .transforms
            .push(backend, bytemuck::bytes_of(&transform))?;
        self.stats.transform_writes += 1;

        backend.draw(&DrawCall {
            uniforms: self.uniforms.id,
            camera_offset: draw_offset(self.camera_offset())?,
            transform_offset: draw_offset(transform_offset)?,
            material_offset: draw_offset(material_offset)?,
            vertex_count: command.mesh.vertex_count(),
            index_count: command.mesh.index_count(),
        });
        self.stats.draws += 1;

        Ok(())
    }

    fn camera_offset(&self) -> u64 {
        u64::from(self.frame_index) * self.layout.camera_block
    }

    #[inline]
    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Number of frames begun so far.
    #[inline]
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    /// Draws issued in the current frame.
    #[inline]
    pub fn draw_index(&self) -> u32 {
        self.transforms.cursor()
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn state(&self) -> &StateCache {
        &self.state
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    pub fn layout(&self) -> &FrameUniformLayout {
        &self.layout
    }

    #[inline]
    pub fn uniforms(&self) -> &FrameUniforms {
        &self.uniforms
    }

    pub fn default_texture(&self) -> &Arc<GpuTexture> {
        &self.default_texture
    }

    pub fn default_texture_array(&self) -> &Arc<GpuTexture> {
        &self.default_texture_array
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.ctx.backend().destroy_frame_uniforms(self.uniforms);
    }
}

fn draw_offset(offset: u64) -> Result<u32> {
    u32::try_from(offset).ok().context(InvalidConfigErr {
        reason: "uniform offset does not fit in 32 bits",
    })
}
