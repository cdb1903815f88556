use crate::assets::{ContentHash, Texture, TextureArray};
use crate::error::Result;
use crate::rendering::{BackendRef, GpuContext, TextureDesc, TextureId};
use tracing::debug;

#[derive(Debug)]
pub struct GpuTexture {
    id: TextureId,
    hash: ContentHash,
    width: u32,
    height: u32,
    layers: u32,
    array: bool,
    backend: BackendRef,
}

impl GpuTexture {
    pub(crate) fn upload(ctx: &GpuContext, texture: &Texture, hash: ContentHash) -> Result<GpuTexture> {
        Self::upload_desc(
            ctx,
            hash,
            &TextureDesc {
                label: &format!("Texture {hash}"),
                width: texture.width(),
                height: texture.height(),
                layers: 1,
                array: false,
                data: texture.data(),
            },
        )
    }

    pub(crate) fn upload_array(ctx: &GpuContext, array: &TextureArray, hash: ContentHash) -> Result<GpuTexture> {
        Self::upload_desc(
            ctx,
            hash,
            &TextureDesc {
                label: &format!("Texture Array {hash}"),
                width: array.width(),
                height: array.height(),
                layers: array.layers(),
                array: true,
                data: array.data(),
            },
        )
    }

    fn upload_desc(ctx: &GpuContext, hash: ContentHash, desc: &TextureDesc) -> Result<GpuTexture> {
        let id = ctx.backend().create_texture(desc)?;
        debug!(
            "Uploaded {}: {}x{}x{}",
            desc.label, desc.width, desc.height, desc.layers
        );

        Ok(GpuTexture {
            id,
            hash,
            width: desc.width,
            height: desc.height,
            layers: desc.layers,
            array: desc.array,
            backend: ctx.downgrade(),
        })
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn content_hash(&self) -> ContentHash {
        self.hash
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn layers(&self) -> u32 {
        self.layers
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.array
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        let id = self.id;
        let what = format!("Texture {}", self.hash);

        self.backend.release(&what, |backend| {
            backend.destroy_texture(id);
            debug!("Destroyed {what}");
        });
    }
}
