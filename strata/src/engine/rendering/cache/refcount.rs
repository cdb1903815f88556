//! Explicitly counted ownership of mesh buffers.
//!
//! This is the alternative to [`WeakCache`](super::WeakCache) for callers that
//! need to decide exactly when GPU objects are destroyed, e.g. before the
//! context is torn down. Owners call [`RefCountTable::increase_ref`] and
//! [`RefCountTable::release`] themselves; the buffers are destroyed the moment
//! the count reaches zero.

use crate::assets::{ContentHash, Geometry};
use crate::error::Result;
use crate::rendering::cache::mesh::upload_vertex_array;
use crate::rendering::{GpuContext, VertexArrayIds};
use std::collections::HashMap;
use strata_utils::debug_panic;
use tracing::{debug, trace};

#[derive(Debug, Copy, Clone)]
struct Counted {
    ids: VertexArrayIds,
    count: usize,
}

/// Keeps the backend alive until it is dropped, and destroys everything still
/// registered when it is.
#[derive(Debug)]
pub struct RefCountTable {
    ctx: GpuContext,
    entries: HashMap<ContentHash, Counted>,
}

impl RefCountTable {
    pub fn new(ctx: &GpuContext) -> Self {
        RefCountTable {
            ctx: ctx.clone(),
            entries: HashMap::new(),
        }
    }

    /// Registers freshly built buffers at a count of one.
    ///
    /// Registering a hash twice keeps the first buffers, destroys `ids` and
    /// counts the call as another reference.
    pub fn new_entry(&mut self, hash: ContentHash, ids: VertexArrayIds) {
        if let Some(existing) = self.entries.get_mut(&hash) {
            debug_panic!("Mesh {hash} was registered twice");

            self.ctx.backend().destroy_vertex_array(ids);
            existing.count += 1;
            return;
        }

        self.entries.insert(hash, Counted { ids, count: 1 });
    }

    /// Adds an owner. Returns false if the hash is not registered.
    pub fn increase_ref(&mut self, hash: ContentHash) -> bool {
        match self.entries.get_mut(&hash) {
            Some(entry) => {
                entry.count += 1;
                trace!("Mesh {hash} now has {} owners", entry.count);
                true
            }
            None => false,
        }
    }

    /// Removes an owner and destroys the buffers once none are left.
    ///
    /// Returns whether the buffers were destroyed. Releasing an unknown hash does nothing.
    pub fn release(&mut self, hash: ContentHash) -> bool {
        let Some(entry) = self.entries.get_mut(&hash) else {
            return false;
        };

        entry.count -= 1;
        if entry.count > 0 {
            return false;
        }

        if let Some(entry) = self.entries.remove(&hash) {
            self.ctx.backend().destroy_vertex_array(entry.ids);
            debug!("Destroyed mesh {hash}");
        }

        true
    }

    /// Returns the registered buffers for `geometry`, uploading them if needed.
    /// Either way, the caller becomes an owner and has to release the hash later.
    pub fn acquire(&mut self, geometry: &Geometry, narrow: bool) -> Result<(ContentHash, VertexArrayIds)> {
        geometry.validate()?;

        let hash = geometry.content_hash();
        if let Some(entry) = self.entries.get_mut(&hash) {
            entry.count += 1;
            return Ok((hash, entry.ids));
        }

        let (ids, _) = upload_vertex_array(&self.ctx, geometry, hash, narrow)?;
        self.new_entry(hash, ids);

        Ok((hash, ids))
    }

    pub fn get(&self, hash: ContentHash) -> Option<VertexArrayIds> {
        self.entries.get(&hash).map(|entry| entry.ids)
    }

    pub fn ref_count(&self, hash: ContentHash) -> usize {
        self.entries.get(&hash).map_or(0, |entry| entry.count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroys every registered mesh regardless of its count. Returns how many there were.
    pub fn destroy_all(&mut self) -> usize {
        let destroyed = self.entries.len();
        for (hash, entry) in self.entries.drain() {
            self.ctx.backend().destroy_vertex_array(entry.ids);
            trace!("Destroyed mesh {hash} with {} owners left", entry.count);
        }
        destroyed
    }
}

impl Drop for RefCountTable {
    fn drop(&mut self) {
        let destroyed = self.destroy_all();
        if destroyed > 0 {
            debug!("Destroyed {destroyed} meshes that were still owned when the table was dropped");
        }
    }
}
