use crate::assets::{ContentHash, Geometry, IndexWidth};
use crate::error::Result;
use crate::rendering::{ArrayId, BackendRef, GpuContext, VertexArrayDesc, VertexArrayIds};
use tracing::debug;

/// Vertex and index buffers of one deduplicated mesh on the GPU.
///
/// The buffers are destroyed when the last `Arc<GpuMesh>` is dropped.
#[derive(Debug)]
pub struct GpuMesh {
    ids: VertexArrayIds,
    hash: ContentHash,
    vertex_count: u32,
    index_count: u32,
    index_width: Option<IndexWidth>,
    backend: BackendRef,
}

impl GpuMesh {
    pub(crate) fn upload(ctx: &GpuContext, geometry: &Geometry, hash: ContentHash, narrow: bool) -> Result<GpuMesh> {
        let (ids, index_width) = upload_vertex_array(ctx, geometry, hash, narrow)?;

        Ok(GpuMesh {
            ids,
            hash,
            vertex_count: geometry.vertex_count() as u32,
            index_count: geometry.index_count() as u32,
            index_width,
            backend: ctx.downgrade(),
        })
    }

    #[inline]
    pub fn array(&self) -> ArrayId {
        self.ids.array
    }

    #[inline]
    pub fn ids(&self) -> VertexArrayIds {
        self.ids
    }

    #[inline]
    pub fn content_hash(&self) -> ContentHash {
        self.hash
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The width the index buffer was uploaded with, if the mesh is indexed.
    #[inline]
    pub fn index_width(&self) -> Option<IndexWidth> {
        self.index_width
    }
}

impl Drop for GpuMesh {
    fn drop(&mut self) {
        let ids = self.ids;
        let what = format!("Mesh {}", self.hash);

        self.backend.release(&what, |backend| {
            backend.destroy_vertex_array(ids);
            debug!("Destroyed {what}");
        });
    }
}

/// Creates the GPU object triple for `geometry`, narrowing the indices if asked to.
///
/// 8-bit indices are widened to 16 bits on backends without 8-bit index support.
pub(crate) fn upload_vertex_array(
    ctx: &GpuContext,
    geometry: &Geometry,
    hash: ContentHash,
    narrow: bool,
) -> Result<(VertexArrayIds, Option<IndexWidth>)> {
    let mut indices = geometry.upload_indices(narrow)?;

    if let Some(narrowed) = &indices
        && narrowed.width() == Some(IndexWidth::U8)
        && !ctx.limits().supports_u8_indices
    {
        indices = Some(narrowed.converted(IndexWidth::U16));
    }

    let label = format!("Mesh {hash}");
    let index_data = indices
        .as_ref()
        .and_then(|indices| indices.width().map(|width| (width, indices.as_bytes())));

    let ids = ctx.backend().create_vertex_array(&VertexArrayDesc {
        label: &label,
        vertices: geometry.vertices(),
        indices: index_data,
    })?;

    let index_width = index_data.map(|(width, _)| width);
    debug!(
        "Uploaded {label}: {} vertices, {} indices ({index_width:?})",
        geometry.vertex_count(),
        geometry.index_count()
    );

    Ok((ids, index_width))
}
