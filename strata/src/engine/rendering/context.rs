use crate::rendering::{BackendLimits, RenderBackend};
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};
use tracing::warn;

/// Owns the graphics backend.
///
/// GPU resources created through the caches only keep a [`BackendRef`] to the
/// backend, so dropping the context ends the backend's lifetime even while
/// handles are still alive. Those handles then leak their GPU objects when
/// they are dropped.
#[derive(Clone)]
pub struct GpuContext {
    backend: Arc<dyn RenderBackend>,
    limits: BackendLimits,
}

impl GpuContext {
    pub fn new(backend: impl RenderBackend + 'static) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub fn from_arc(backend: Arc<dyn RenderBackend>) -> Self {
        let limits = backend.limits();
        GpuContext { backend, limits }
    }

    #[inline]
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    #[inline]
    pub fn limits(&self) -> BackendLimits {
        self.limits
    }

    pub fn downgrade(&self) -> BackendRef {
        BackendRef(Arc::downgrade(&self.backend))
    }
}

impl Debug for GpuContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("backend", &self.backend.name())
            .field("limits", &self.limits)
            .finish()
    }
}

/// A non-owning reference to the backend of a [`GpuContext`].
#[derive(Clone)]
pub struct BackendRef(Weak<dyn RenderBackend>);

impl BackendRef {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Runs `destroy` if the backend still exists, otherwise warns that `what` leaks.
    pub fn release(&self, what: &str, destroy: impl FnOnce(&dyn RenderBackend)) {
        match self.0.upgrade() {
            Some(backend) => destroy(backend.as_ref()),
            None => warn!("{what} was released after its GPU context was dropped. It will leak."),
        }
    }
}

impl Debug for BackendRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("BackendRef").field(&self.is_alive()).finish()
    }
}
