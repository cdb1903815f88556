use more_asserts::assert_gt;
use nalgebra::{Matrix4, Vector4};
use std::sync::Arc;
use strata::assets::{Material, ShaderSource, Texture};
use strata::drawables::MeshDrawable;
use strata::error::RenderError;
use strata::rendering::cache::{GpuMesh, GpuTexture};
use strata::rendering::ring_buffer::calc_ringbuffer;
use strata::rendering::uniform::CameraUniform;
use strata::rendering::{BackendCall, DrawCall, RecordingBackend, RenderConfig, Renderer};
use strata::scene::DrawList;

mod common;

const SIZE: (u32, u32) = (800, 600);

fn camera() -> CameraUniform {
    CameraUniform::new(Matrix4::identity(), Matrix4::new_orthographic(0.0, 800.0, 0.0, 600.0, -1.0, 1.0))
}

fn draws(log: &[BackendCall]) -> Vec<DrawCall> {
    log.iter()
        .filter_map(|call| match call {
            BackendCall::Draw(draw) => Some(*draw),
            _ => None,
        })
        .collect()
}

fn count(log: &[BackendCall], filter: impl Fn(&BackendCall) -> bool) -> usize {
    log.iter().filter(|call| filter(call)).count()
}

struct Fixture {
    gpu: common::TestGpu,
    mesh: Arc<GpuMesh>,
    texture: Arc<GpuTexture>,
}

fn fixture() -> Fixture {
    let gpu = common::gpu();
    let mesh = gpu.assets.mesh(&common::quad(0.0)).unwrap();
    let texture = gpu.assets.texture(&Texture::solid(2, 2, [200, 100, 50, 255])).unwrap();
    gpu.log.clear();

    Fixture { gpu, mesh, texture }
}

impl Fixture {
    fn renderer(&self) -> Renderer {
        self.renderer_with(RenderConfig::default())
    }

    fn renderer_with(&self, config: RenderConfig) -> Renderer {
        let renderer = Renderer::new(&self.gpu.assets, config).unwrap();
        self.gpu.log.clear();
        renderer
    }

    fn drawable(&self, x: f32) -> MeshDrawable {
        let material = Material::builder().texture(self.texture.clone()).build();
        let mut drawable = MeshDrawable::new(self.mesh.clone(), material);
        drawable.transform.set_position(x, 0.0, 0.0);
        drawable
    }
}

#[test]
fn shared_state_is_bound_once() {
    let f = fixture();
    let mut renderer = f.renderer();

    renderer.begin_frame(&SIZE);
    assert!(renderer.set_camera(&camera()).unwrap());
    for i in 0..10 {
        renderer.submit(&f.drawable(i as f32)).unwrap();
    }
    let stats = renderer.flush().unwrap();

    assert_eq!(stats.draws, 10);
    assert_eq!(stats.program_binds, 1);
    assert_eq!(stats.array_binds, 1);
    // one bind per texture unit
    assert_eq!(stats.texture_binds, 2);
    assert_eq!(stats.material_writes, 1);
    assert_eq!(stats.transform_writes, 10);
    assert_eq!(stats.camera_writes, 1);
    assert_eq!(stats.uniform_writes(), 12);

    let log = f.gpu.log.take();
    assert_eq!(count(&log, |c| matches!(c, BackendCall::BindProgram(_))), 1);
    assert_eq!(count(&log, |c| matches!(c, BackendCall::BindTexture { unit: 0, .. })), 1);
    assert_eq!(count(&log, |c| matches!(c, BackendCall::BindTexture { unit: 1, .. })), 1);
    assert_eq!(count(&log, |c| matches!(c, BackendCall::BindVertexArray(_))), 1);
    assert_eq!(count(&log, |c| matches!(c, BackendCall::WriteUniform { .. })), 12);
    assert_eq!(draws(&log).len(), 10);
    assert!(log.contains(&BackendCall::BindTexture {
        unit: 0,
        texture: f.texture.id()
    }));
    assert_eq!(f.gpu.log.misuses(), 0);
}

#[test]
fn binds_come_before_the_draw_that_needs_them() {
    let f = fixture();
    let mut renderer = f.renderer();

    renderer.begin_frame(&SIZE);
    renderer.submit(&f.drawable(0.0)).unwrap();
    renderer.flush().unwrap();

    let log = f.gpu.log.take();
    assert!(matches!(log[0], BackendCall::SetViewport { width: 800, height: 600 }));
    assert!(matches!(log[1], BackendCall::BindProgram(_)));
    assert!(matches!(log[2], BackendCall::BindTexture { unit: 0, .. }));
    assert!(matches!(log[3], BackendCall::BindTexture { unit: 1, .. }));
    assert!(matches!(log[4], BackendCall::BindVertexArray(_)));
    assert!(matches!(log.last(), Some(BackendCall::Draw(_))));
}

#[test]
fn each_frame_starts_unbound() {
    let f = fixture();
    let mut renderer = f.renderer();

    for frame in 0..3 {
        renderer.begin_frame(&SIZE);
        assert!(renderer.state().is_unbound());

        renderer.submit(&f.drawable(0.0)).unwrap();
        renderer.submit(&f.drawable(1.0)).unwrap();
        let stats = renderer.flush().unwrap();

        assert_eq!(stats.program_binds, 1, "frame {frame}");
        assert_eq!(stats.material_writes, 1, "frame {frame}");
        assert_eq!(renderer.draw_index(), 2);
    }

    assert_eq!(renderer.frame_counter(), 3);
}

#[test]
fn uniforms_are_written_into_the_slot_of_the_frame() {
    let f = fixture();
    let mut renderer = f.renderer();
    let layout = *renderer.layout();
    let max_draws = renderer.config().max_draws;

    let mut seen = Vec::new();
    for frame in 0..4u32 {
        renderer.begin_frame(&SIZE);
        renderer.set_camera(&camera()).unwrap();
        assert_eq!(renderer.frame_index(), frame % 3);

        for i in 0..3 {
            renderer.submit(&f.drawable(i as f32)).unwrap();
        }
        renderer.flush().unwrap();

        let slot = frame % 3;
        let calls = draws(&f.gpu.log.take());
        for (i, draw) in calls.iter().enumerate() {
            let expected = calc_ringbuffer(slot, 3, i as u32, layout.transform_block, max_draws);
            assert_eq!(u64::from(draw.transform_offset), expected);
            assert_eq!(u64::from(draw.camera_offset), u64::from(slot) * layout.camera_block);
            assert_eq!(
                u64::from(draw.material_offset),
                calc_ringbuffer(slot, 3, 0, layout.material_block, max_draws)
            );
            assert_eq!(draw.index_count, 6);
            seen.push((frame, draw.transform_offset));
        }
    }

    // frames 0 and 3 reuse the same slot, every other offset is unique
    let frame_zero: Vec<_> = seen.iter().filter(|(f, _)| *f == 0).map(|(_, o)| *o).collect();
    let frame_three: Vec<_> = seen.iter().filter(|(f, _)| *f == 3).map(|(_, o)| *o).collect();
    assert_eq!(frame_zero, frame_three);

    let mut unique: Vec<_> = seen.iter().filter(|(f, _)| *f < 3).map(|(_, o)| *o).collect();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 9);
    assert_eq!(f.gpu.log.misuses(), 0);
}

#[test]
fn material_is_rewritten_only_when_it_changes() {
    let f = fixture();
    let mut renderer = f.renderer();

    let mut tinted = f.drawable(0.0);
    tinted.material.color = Vector4::new(0.5, 0.5, 0.5, 1.0);
    let mut nearly = f.drawable(1.0);
    nearly.material.color = Vector4::new(0.5004, 0.5, 0.5, 1.0);
    let mut other = f.drawable(2.0);
    other.material.color = Vector4::new(1.0, 0.0, 0.0, 1.0);

    renderer.begin_frame(&SIZE);
    for drawable in [&tinted, &nearly, &other, &other] {
        renderer.submit(drawable).unwrap();
    }
    let stats = renderer.flush().unwrap();

    assert_eq!(stats.material_writes, 2);

    let calls = draws(&f.gpu.log.take());
    assert_eq!(calls[0].material_offset, calls[1].material_offset);
    assert_ne!(calls[1].material_offset, calls[2].material_offset);
    assert_eq!(calls[2].material_offset, calls[3].material_offset);
}

#[test]
fn sorted_list_switches_textures_once_per_group() {
    let f = fixture();
    let other = f
        .gpu
        .assets
        .texture(&Texture::solid(2, 2, [0, 0, 0, 255]))
        .unwrap();
    let mut renderer = f.renderer();
    let mut list = DrawList::new();

    for i in 0..8 {
        let mut drawable = f.drawable(i as f32);
        if i % 2 == 0 {
            drawable.material.set_texture(Some(other.clone()));
        }
        list.add(i, drawable).unwrap();
    }

    renderer.begin_frame(&SIZE);
    assert_eq!(renderer.submit_list(&list).unwrap(), 8);
    let stats = renderer.flush().unwrap();

    assert_eq!(stats.draws, 8);
    let log = f.gpu.log.take();
    assert_eq!(count(&log, |c| matches!(c, BackendCall::BindTexture { unit: 0, .. })), 2);
    assert_eq!(count(&log, |c| matches!(c, BackendCall::BindProgram(_))), 1);
}

#[test]
fn program_overrides_switch_programs() {
    let f = fixture();
    let flat = f.gpu.assets.program(&ShaderSource::flat_color()).unwrap();
    let mut renderer = f.renderer();

    renderer.begin_frame(&SIZE);
    renderer.submit(&f.drawable(0.0)).unwrap();
    renderer.submit(&f.drawable(1.0).with_program(flat.clone())).unwrap();
    renderer.submit(&f.drawable(2.0).with_program(flat.clone())).unwrap();
    let stats = renderer.flush().unwrap();

    assert_eq!(stats.program_binds, 2);
    assert_eq!(renderer.state().program(), Some(flat.id()));
}

#[test]
fn camera_is_written_once_per_frame() {
    let f = fixture();
    let mut renderer = f.renderer();

    renderer.begin_frame(&SIZE);
    assert!(renderer.set_camera(&camera()).unwrap());
    assert!(!renderer.set_camera(&camera()).unwrap());

    renderer.begin_frame(&SIZE);
    assert!(renderer.set_camera(&camera()).unwrap());

    let log = f.gpu.log.take();
    let camera_buffer = renderer.uniforms().camera;
    let offsets: Vec<_> = log
        .iter()
        .filter_map(|call| match call {
            BackendCall::WriteUniform { buffer, offset, .. } if *buffer == camera_buffer => Some(*offset),
            _ => None,
        })
        .collect();
    assert_eq!(offsets, [0, renderer.layout().camera_block]);
}

#[test]
fn nothing_works_before_the_first_frame() {
    let f = fixture();
    let mut renderer = f.renderer();

    assert!(matches!(renderer.submit(&f.drawable(0.0)), Err(RenderError::FrameNotStarted)));
    assert!(matches!(renderer.set_camera(&camera()), Err(RenderError::FrameNotStarted)));
    assert!(matches!(renderer.flush(), Err(RenderError::FrameNotStarted)));
    assert!(f.gpu.log.is_empty());
}

#[test]
fn overflowing_a_slot_fails_the_flush() {
    let f = fixture();
    let config = RenderConfig::builder().max_draws(2).build();
    let mut renderer = f.renderer_with(config);

    renderer.begin_frame(&SIZE);
    for i in 0..3 {
        renderer.submit(&f.drawable(i as f32)).unwrap();
    }
    let result = renderer.flush();

    assert!(matches!(
        result,
        Err(RenderError::UniformOverflow { draw: 2, capacity: 2 })
    ));
    assert_eq!(renderer.stats().draws, 2);
    assert_eq!(renderer.queued(), 0);
    assert_eq!(f.gpu.log.misuses(), 0);

    // the next frame starts over
    renderer.begin_frame(&SIZE);
    renderer.submit(&f.drawable(0.0)).unwrap();
    assert_eq!(renderer.flush().unwrap().draws, 1);
}

#[test]
fn unflushed_draws_are_dropped_by_the_next_frame() {
    let f = fixture();
    let mut renderer = f.renderer();

    renderer.begin_frame(&SIZE);
    renderer.submit(&f.drawable(0.0)).unwrap();
    assert_eq!(renderer.queued(), 1);

    renderer.begin_frame(&SIZE);
    assert_eq!(renderer.queued(), 0);
    assert_eq!(renderer.flush().unwrap().draws, 0);
}

#[test]
fn invalid_configs_are_rejected() {
    let f = fixture();

    for config in [
        RenderConfig::builder().frames_in_flight(1).build(),
        RenderConfig::builder().max_draws(0).build(),
        RenderConfig::builder().max_material_changes(0).build(),
        RenderConfig::builder().material_epsilon(-1.0).build(),
    ] {
        assert!(matches!(
            Renderer::new(&f.gpu.assets, config),
            Err(RenderError::InvalidConfig { .. })
        ));
    }
}

#[test]
fn flushed_meshes_live_until_the_next_frame() {
    let f = fixture();
    let mut renderer = f.renderer();

    let mesh = f.gpu.assets.mesh(&common::quad(5.0)).unwrap();
    let array = mesh.array();
    let drawable = MeshDrawable::new(mesh, Material::default());

    renderer.begin_frame(&SIZE);
    renderer.submit(&drawable).unwrap();
    renderer.flush().unwrap();
    drop(drawable);

    let destroyed = |gpu: &common::TestGpu| gpu.log.count(|call| *call == BackendCall::DestroyVertexArray(array));
    assert_eq!(destroyed(&f.gpu), 0);

    renderer.begin_frame(&SIZE);
    assert_eq!(destroyed(&f.gpu), 1);
    assert_eq!(f.gpu.log.misuses(), 0);
}

#[test]
fn uniform_regions_past_32_bit_offsets_are_rejected() {
    let f = fixture();
    f.gpu.log.clear();

    // 3 slots of 9M transform blocks reach past u32::MAX
    let config = RenderConfig::builder().max_draws(9_000_000).build();
    let result = Renderer::new(&f.gpu.assets, config);

    assert!(matches!(result, Err(RenderError::InvalidConfig { .. })));
    assert_eq!(f.gpu.log.count(|call| matches!(call, BackendCall::CreateFrameUniforms(_))), 0);
    assert_eq!(f.gpu.log.live().uniform_sets, 0);
}

#[test]
fn dropping_the_renderer_frees_its_uniforms() {
    let gpu = common::gpu_with(RecordingBackend::new(), &RenderConfig::default());
    let renderer = Renderer::new(&gpu.assets, RenderConfig::default()).unwrap();

    let live = gpu.log.live();
    assert_eq!(live.uniform_sets, 1);
    assert_gt!(live.buffers, 0);

    let id = renderer.uniforms().id;
    drop(renderer);

    assert_eq!(gpu.log.live().uniform_sets, 0);
    assert!(gpu.log.calls().contains(&BackendCall::DestroyFrameUniforms(id)));
    assert_eq!(gpu.log.misuses(), 0);
}
