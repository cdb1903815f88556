use smallvec::{SmallVec, smallvec};
use std::marker::PhantomData;
use std::num::NonZeroU64;
use strata_macros::UniformIndex;
use strata_utils::ShaderUniformIndex;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindingResource, Buffer, BufferAddress,
    BufferBinding, BufferDescriptor, BufferUsages, Device, Sampler, TextureView,
};

/// Bindings of a texture bind group.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, UniformIndex)]
pub enum TextureUniformIndex {
    View = 0,
    Sampler = 1,
}

/// A bind group together with the buffers it owns, indexed by `I`.
#[derive(Debug, Clone)]
pub struct ShaderUniform<I: ShaderUniformIndex> {
    buffers: UniformBufferStorage<I>,
    bind_group: BindGroup,
}

pub struct ShaderUniformBuilder<'a, I: ShaderUniformIndex> {
    bind_group_layout: &'a BindGroupLayout,
    data: SmallVec<[ResourceDesc<'a, I>; 4]>,
}

enum ResourceDesc<'a, I: ShaderUniformIndex> {
    /// A buffer of `size` bytes that is bound `block` bytes at a time with a dynamic offset.
    RingBuffer { size: u64, block: u64, name: I },
    TextureView { view: &'a TextureView, name: I },
    Sampler { sampler: &'a Sampler, name: I },
}

#[derive(Debug, Clone)]
struct UniformBufferStorage<I: ShaderUniformIndex> {
    buffers: SmallVec<[Option<Buffer>; 4]>,

    _indexer: PhantomData<I>,
}

impl<'a, I: ShaderUniformIndex + 'static> ShaderUniformBuilder<'a, I> {
    #[inline]
    pub fn build(self, device: &Device) -> ShaderUniform<I> {
        let buffers = UniformBufferStorage::new(device, &self.data);
        let bind_group = self.bind_group(device, &buffers);

        ShaderUniform { buffers, bind_group }
    }

    #[inline]
    fn next_index(&self) -> I {
        let idx = self.data.len();
        I::by_index(idx).unwrap_or_else(|| {
            panic!(
                "The buffer index #{idx} was not registered as a member of shader uniform {}",
                I::name()
            );
        })
    }

    #[inline]
    pub fn with_ring_buffer(mut self, size: u64, block: u64) -> Self {
        let name = self.next_index();
        self.data.push(ResourceDesc::RingBuffer { size, block, name });
        self
    }

    #[inline]
    pub fn with_texture_view(mut self, view: &'a TextureView) -> Self {
        let name = self.next_index();
        self.data.push(ResourceDesc::TextureView { view, name });
        self
    }

    #[inline]
    pub fn with_sampler(mut self, sampler: &'a Sampler) -> Self {
        let name = self.next_index();
        self.data.push(ResourceDesc::Sampler { sampler, name });
        self
    }

    #[inline]
    fn entries<'b>(&'b self, buffers: &'b UniformBufferStorage<I>) -> SmallVec<[BindGroupEntry<'b>; 4]> {
        self.data.iter().filter_map(|desc| desc.entry(buffers)).collect()
    }

    #[inline]
    fn bind_group(&self, device: &Device, buffers: &UniformBufferStorage<I>) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some(&format!("{} Uniform Bind Group", I::name())),
            layout: self.bind_group_layout,
            entries: &self.entries(buffers),
        })
    }
}

impl<I: ShaderUniformIndex> ShaderUniform<I> {
    #[inline]
    pub fn builder(bind_group_layout: &BindGroupLayout) -> ShaderUniformBuilder<'_, I> {
        ShaderUniformBuilder {
            bind_group_layout,
            data: smallvec![],
        }
    }

    #[inline]
    pub fn bind_group(&self) -> &BindGroup {
        &self.bind_group
    }

    /// The buffer behind `idx`, `None` if that binding is a texture or sampler.
    pub fn buffer(&self, idx: I) -> Option<&Buffer> {
        self.buffers.buffers.get(idx.index())?.as_ref()
    }
}

impl<I: ShaderUniformIndex> UniformBufferStorage<I> {
    #[inline]
    fn new(device: &Device, desc: &[ResourceDesc<I>]) -> Self {
        assert_eq!(desc.len(), I::MAX + 1);

        let buffers = desc.iter().map(|desc| desc.make_buffer(device)).collect();

        UniformBufferStorage {
            buffers,
            _indexer: PhantomData,
        }
    }
}

impl<I: ShaderUniformIndex> ResourceDesc<'_, I> {
    #[inline]
    fn name(&self) -> &I {
        match self {
            ResourceDesc::RingBuffer { name, .. }
            | ResourceDesc::TextureView { name, .. }
            | ResourceDesc::Sampler { name, .. } => name,
        }
    }

    #[inline]
    fn index(&self) -> usize {
        self.name().index()
    }

    #[inline]
    fn buffer_name(&self) -> Option<String> {
        if cfg!(debug_assertions) {
            Some(format!("{:?} Uniform Buffer", self.name()))
        } else {
            None
        }
    }

    #[inline]
    fn entry<'a>(&'a self, buffers: &'a UniformBufferStorage<I>) -> Option<BindGroupEntry<'a>> {
        let resource = match self {
            ResourceDesc::RingBuffer { block, .. } => BindingResource::Buffer(BufferBinding {
                buffer: buffers.buffers.get(self.index())?.as_ref()?,
                offset: 0,
                size: NonZeroU64::new(*block),
            }),
            ResourceDesc::TextureView { view, .. } => BindingResource::TextureView(view),
            ResourceDesc::Sampler { sampler, .. } => BindingResource::Sampler(sampler),
        };

        Some(BindGroupEntry {
            binding: self.index() as u32,
            resource,
        })
    }

    #[inline]
    fn make_buffer(&self, device: &Device) -> Option<Buffer> {
        match self {
            ResourceDesc::RingBuffer { size, .. } => {
                Some(device.create_buffer(&BufferDescriptor {
                    label: self.buffer_name().as_deref(),
                    size: *size as BufferAddress,
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }))
            }
            ResourceDesc::TextureView { .. } | ResourceDesc::Sampler { .. } => None,
        }
    }
}
