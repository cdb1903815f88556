use crate::assets::{ContentHash, ContentHasher, ShaderStage, StageSource};
use crate::error::Result;
use crate::rendering::{BackendRef, GpuContext, ProgramId, ShaderId};
use std::sync::Arc;
use tracing::debug;

/// A compiled shader stage.
#[derive(Debug)]
pub struct GpuShader {
    id: ShaderId,
    stage: ShaderStage,
    hash: ContentHash,
    backend: BackendRef,
}

impl GpuShader {
    pub(crate) fn compile(ctx: &GpuContext, source: &StageSource, hash: ContentHash, name: &str) -> Result<GpuShader> {
        let label = format!("{name} ({} stage)", source.stage);
        let id = ctx.backend().create_shader(source.stage, &source.code, &label)?;
        debug!("Compiled shader {label} as {hash}");

        Ok(GpuShader {
            id,
            stage: source.stage,
            hash,
            backend: ctx.downgrade(),
        })
    }

    #[inline]
    pub fn id(&self) -> ShaderId {
        self.id
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn content_hash(&self) -> ContentHash {
        self.hash
    }
}

impl Drop for GpuShader {
    fn drop(&mut self) {
        let id = self.id;
        let what = format!("{} shader {}", self.stage, self.hash);

        self.backend.release(&what, |backend| {
            backend.destroy_shader(id);
            debug!("Destroyed {what}");
        });
    }
}

/// A linked program. It keeps both of its stages alive.
#[derive(Debug)]
pub struct GpuProgram {
    id: ProgramId,
    hash: ContentHash,
    vertex: Arc<GpuShader>,
    fragment: Arc<GpuShader>,
    backend: BackendRef,
}

impl GpuProgram {
    /// Programs are keyed by the hashes of their two stages.
    pub fn key(vertex: ContentHash, fragment: ContentHash) -> ContentHash {
        let mut hasher = ContentHasher::new();
        hasher.write_u64(vertex.value()).write_u64(fragment.value());
        hasher.finish()
    }

    pub(crate) fn link(
        ctx: &GpuContext,
        vertex: Arc<GpuShader>,
        fragment: Arc<GpuShader>,
        hash: ContentHash,
        name: &str,
    ) -> Result<GpuProgram> {
        let id = ctx.backend().create_program(vertex.id(), fragment.id(), name)?;
        debug!("Linked program {name} as {hash}");

        Ok(GpuProgram {
            id,
            hash,
            vertex,
            fragment,
            backend: ctx.downgrade(),
        })
    }

    #[inline]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    #[inline]
    pub fn content_hash(&self) -> ContentHash {
        self.hash
    }

    pub fn vertex(&self) -> &Arc<GpuShader> {
        &self.vertex
    }

    pub fn fragment(&self) -> &Arc<GpuShader> {
        &self.fragment
    }
}

impl Drop for GpuProgram {
    fn drop(&mut self) {
        let id = self.id;
        let what = format!("Program {}", self.hash);

        self.backend.release(&what, |backend| {
            backend.destroy_program(id);
            debug!("Destroyed {what}");
        });
    }
}
