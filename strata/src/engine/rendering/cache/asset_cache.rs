//! Deduplicated GPU resources, keyed by content.
//!
//! Every upload goes through [`AssetCache`]. Uploading byte-identical geometry,
//! shader source or pixels twice returns the same `Arc` as long as the first
//! one is still alive. Nothing is kept alive by the cache itself except the
//! built-in defaults, which are released by [`AssetCache::shutdown`].

use crate::assets::*;
use crate::error::*;
use crate::rendering::cache::{GpuMesh, GpuProgram, GpuShader, GpuTexture, WeakCache};
use crate::rendering::{GpuContext, RenderConfig};
use snafu::ensure;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AssetCache {
    ctx: GpuContext,
    narrow_indices: bool,

    pub meshes: WeakCache<GpuMesh>,
    pub shaders: WeakCache<GpuShader>,
    pub programs: WeakCache<GpuProgram>,
    pub textures: WeakCache<GpuTexture>,

    default_program: Arc<GpuProgram>,
    default_texture: Arc<GpuTexture>,
    default_texture_array: Arc<GpuTexture>,
}

/// Handles that were still alive outside the cache when it was shut down.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    pub meshes: usize,
    pub shaders: usize,
    pub programs: usize,
    pub textures: usize,
}

impl ShutdownReport {
    pub fn total(&self) -> usize {
        self.meshes + self.shaders + self.programs + self.textures
    }
}

impl AssetCache {
    pub fn new(ctx: &GpuContext, config: &RenderConfig) -> Result<Self> {
        let meshes = WeakCache::new("Mesh");
        let shaders = WeakCache::new("Shader");
        let programs = WeakCache::new("Program");
        let textures = WeakCache::new("Texture");

        let default_program = Self::acquire_program(ctx, &shaders, &programs, &ShaderSource::default_program())?;
        let default_texture = Self::acquire_texture(ctx, &textures, &Texture::white())?;
        let default_texture_array = Self::acquire_texture_array(ctx, &textures, &TextureArray::white())?;

        debug!("Asset cache created on the {} backend", ctx.backend().name());

        Ok(AssetCache {
            ctx: ctx.clone(),
            narrow_indices: config.narrow_indices,
            meshes,
            shaders,
            programs,
            textures,
            default_program,
            default_texture,
            default_texture_array,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Uploads the geometry, or returns the live mesh with the same content.
    pub fn mesh(&self, geometry: &Geometry) -> Result<Arc<GpuMesh>> {
        geometry.validate()?;

        let hash = geometry.content_hash();
        self.meshes
            .acquire(hash, || GpuMesh::upload(&self.ctx, geometry, hash, self.narrow_indices))
    }

    pub fn shader(&self, source: &StageSource, name: &str) -> Result<Arc<GpuShader>> {
        Self::acquire_shader(&self.ctx, &self.shaders, source, name)
    }

    pub fn program(&self, source: &ShaderSource) -> Result<Arc<GpuProgram>> {
        Self::acquire_program(&self.ctx, &self.shaders, &self.programs, source)
    }

    pub fn texture(&self, texture: &Texture) -> Result<Arc<GpuTexture>> {
        Self::acquire_texture(&self.ctx, &self.textures, texture)
    }

    pub fn texture_array(&self, array: &TextureArray) -> Result<Arc<GpuTexture>> {
        Self::acquire_texture_array(&self.ctx, &self.textures, array)
    }

    pub fn default_program(&self) -> &Arc<GpuProgram> {
        &self.default_program
    }

    /// The 1x1 solid white texture that replaces unset textures.
    pub fn default_texture(&self) -> &Arc<GpuTexture> {
        &self.default_texture
    }

    /// The single-layer solid white array that replaces unset array textures.
    pub fn default_texture_array(&self) -> &Arc<GpuTexture> {
        &self.default_texture_array
    }

    /// Releases the defaults and forgets every lapsed entry.
    ///
    /// Handles that are still held elsewhere are reported and logged. They are
    /// destroyed whenever their last owner drops them, or leak if the
    /// [`GpuContext`] is gone by then.
    pub fn shutdown(self) -> ShutdownReport {
        let AssetCache {
            meshes,
            shaders,
            programs,
            textures,
            default_program,
            default_texture,
            default_texture_array,
            ..
        } = self;

        drop(default_program);
        drop(default_texture);
        drop(default_texture_array);

        for purged in [
            meshes.purge_expired(),
            shaders.purge_expired(),
            programs.purge_expired(),
            textures.purge_expired(),
        ] {
            debug!("Purged {purged} expired cache entries");
        }

        let report = ShutdownReport {
            meshes: meshes.live_count(),
            shaders: shaders.live_count(),
            programs: programs.live_count(),
            textures: textures.live_count(),
        };

        if report.total() > 0 {
            warn!("Asset cache shut down with live handles remaining: {report:?}");
        }

        report
    }

    fn acquire_shader(
        ctx: &GpuContext,
        shaders: &WeakCache<GpuShader>,
        source: &StageSource,
        name: &str,
    ) -> Result<Arc<GpuShader>> {
        let hash = source.content_hash();
        shaders.acquire(hash, || GpuShader::compile(ctx, source, hash, name))
    }

    fn acquire_program(
        ctx: &GpuContext,
        shaders: &WeakCache<GpuShader>,
        programs: &WeakCache<GpuProgram>,
        source: &ShaderSource,
    ) -> Result<Arc<GpuProgram>> {
        let (vertex, fragment) = source.resolve()?;
        let vertex = Self::acquire_shader(ctx, shaders, &vertex, &source.name)?;
        let fragment = Self::acquire_shader(ctx, shaders, &fragment, &source.name)?;

        let hash = GpuProgram::key(vertex.content_hash(), fragment.content_hash());
        programs.acquire(hash, || GpuProgram::link(ctx, vertex, fragment, hash, &source.name))
    }

    fn acquire_texture(ctx: &GpuContext, textures: &WeakCache<GpuTexture>, texture: &Texture) -> Result<Arc<GpuTexture>> {
        let hash = texture.content_hash();
        textures.acquire(hash, || GpuTexture::upload(ctx, texture, hash))
    }

    fn acquire_texture_array(
        ctx: &GpuContext,
        textures: &WeakCache<GpuTexture>,
        array: &TextureArray,
    ) -> Result<Arc<GpuTexture>> {
        let limit = ctx.limits().max_texture_array_layers;
        ensure!(array.layers() <= limit, TextureArrayFullErr { limit });
        ensure!(
            array.layers() > 0,
            InvalidTextureDataErr {
                expected: array.width() as usize * array.height() as usize * 4,
                actual: 0usize,
            }
        );

        let hash = array.content_hash();
        textures.acquire(hash, || GpuTexture::upload_array(ctx, array, hash))
    }
}
