use crate::assets::ContentHash;
use crate::error::Result;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{trace, warn};

/// Content-addressed cache that only holds weak references.
///
/// A value lives as long as someone outside the cache holds the returned `Arc`.
/// Once the last one is dropped the entry lapses and the next [`acquire`](Self::acquire)
/// for the same hash builds a new value.
pub struct WeakCache<T> {
    name: &'static str,
    data: DashMap<ContentHash, Weak<T>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
    expired: AtomicUsize,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    /// Misses that replaced a lapsed entry.
    pub expired: usize,
}

impl<T> WeakCache<T> {
    pub fn new(name: &'static str) -> Self {
        WeakCache {
            name,
            data: DashMap::new(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            expired: AtomicUsize::new(0),
        }
    }

    /// Returns the live value for `hash` or builds, stores and returns a new one.
    ///
    /// The lookup, the expiry check and the replacement happen while the entry is
    /// locked, so no caller ever sees a lapsed entry. If `build` fails on a
    /// lapsed entry, the entry is removed.
    pub fn acquire(&self, hash: ContentHash, build: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        match self.data.entry(hash) {
            Entry::Occupied(mut entry) => {
                if let Some(live) = entry.get().upgrade() {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    trace!("[{} Cache] Hit {hash}", self.name);
                    return Ok(live);
                }

                let expired = self.expired.fetch_add(1, Ordering::Relaxed) + 1;
                if expired % 1000 == 0 {
                    warn!("[{} Cache] Replaced {expired} expired entries so far", self.name);
                }

                match build() {
                    Ok(value) => {
                        let value = Arc::new(value);
                        entry.insert(Arc::downgrade(&value));
                        self.record_miss(hash);
                        Ok(value)
                    }
                    Err(e) => {
                        entry.remove();
                        Err(e)
                    }
                }
            }
            Entry::Vacant(entry) => {
                let value = Arc::new(build()?);
                entry.insert(Arc::downgrade(&value));
                self.record_miss(hash);
                Ok(value)
            }
        }
    }

    fn record_miss(&self, hash: ContentHash) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!("[{} Cache] Miss {hash}", self.name);
    }

    /// The live value for `hash`, without building anything.
    pub fn get(&self, hash: ContentHash) -> Option<Arc<T>> {
        self.data.get(&hash).and_then(|entry| entry.upgrade())
    }

    pub fn contains_live(&self, hash: ContentHash) -> bool {
        self.data
            .get(&hash)
            .is_some_and(|entry| entry.strong_count() > 0)
    }

    /// Drops every lapsed entry and returns how many there were.
    pub fn purge_expired(&self) -> usize {
        let before = self.data.len();
        self.data.retain(|_, entry| entry.strong_count() > 0);
        before.saturating_sub(self.data.len())
    }

    /// Number of entries whose value is still alive.
    pub fn live_count(&self) -> usize {
        self.data
            .iter()
            .filter(|entry| entry.value().strong_count() > 0)
            .count()
    }

    /// Number of entries, including lapsed ones.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    #[test]
    fn failed_rebuild_removes_lapsed_entry() {
        let cache = WeakCache::<u32>::new("Test");
        let hash = ContentHash::from_raw(7);

        drop(cache.acquire(hash, || Ok(1)).unwrap());
        assert_eq!(cache.len(), 1);

        let result = cache.acquire(hash, || Err(RenderError::EmptyGeometry));
        assert!(matches!(result, Err(RenderError::EmptyGeometry)));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired, 1);
    }
}
