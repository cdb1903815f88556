use crate::engine::core::Vertex3D;
use crate::rendering::uniform::{CameraUniform, MaterialUniform, TransformUniform};
use std::num::NonZeroU64;
use wgpu::*;

/// Format of the surface the backend draws into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WgpuTargets {
    pub color: TextureFormat,
    pub depth: Option<TextureFormat>,
}

impl Default for WgpuTargets {
    fn default() -> Self {
        WgpuTargets {
            color: TextureFormat::Bgra8UnormSrgb,
            depth: Some(TextureFormat::Depth32Float),
        }
    }
}

pub(super) const VERTEX_BUFFERS: [VertexBufferLayout; 1] = [Vertex3D::continuous_descriptor()];

pub(super) struct Layouts {
    pub frame: BindGroupLayout,
    pub diffuse: BindGroupLayout,
    pub layered: BindGroupLayout,
    pub pipeline: PipelineLayout,
}

impl Layouts {
    pub fn new(device: &Device) -> Self {
        let frame = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                ring_entry(0, size_of::<CameraUniform>() as u64),
                ring_entry(1, size_of::<TransformUniform>() as u64),
                ring_entry(2, size_of::<MaterialUniform>() as u64),
            ],
        });
        let diffuse = texture_layout(device, "Diffuse Bind Group Layout", TextureViewDimension::D2);
        let layered = texture_layout(device, "Layered Bind Group Layout", TextureViewDimension::D2Array);

        let pipeline = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Default Pipeline Layout"),
            bind_group_layouts: &[&frame, &diffuse, &layered],
            push_constant_ranges: &[],
        });

        Layouts {
            frame,
            diffuse,
            layered,
            pipeline,
        }
    }
}

fn ring_entry(binding: u32, min_size: u64) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: ShaderStages::VERTEX_FRAGMENT,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: NonZeroU64::new(min_size),
        },
        count: None,
    }
}

fn texture_layout(device: &Device, label: &str, view_dimension: TextureViewDimension) -> BindGroupLayout {
    device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[
            BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Texture {
                    sample_type: TextureSampleType::Float { filterable: true },
                    view_dimension,
                    multisampled: false,
                },
                count: None,
            },
            BindGroupLayoutEntry {
                binding: 1,
                visibility: ShaderStages::FRAGMENT,
                ty: BindingType::Sampler(SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub(super) fn color_targets(targets: &WgpuTargets) -> [Option<ColorTargetState>; 1] {
    [Some(ColorTargetState {
        format: targets.color,
        blend: Some(BlendState::ALPHA_BLENDING),
        write_mask: ColorWrites::all(),
    })]
}

pub(super) fn depth_stencil(targets: &WgpuTargets) -> Option<DepthStencilState> {
    targets.depth.map(|format| DepthStencilState {
        format,
        depth_write_enabled: true,
        depth_compare: CompareFunction::Less,
        stencil: StencilState::default(),
        bias: DepthBiasState::default(),
    })
}
