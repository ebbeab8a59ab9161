//! The shared scan callback.
//!
//! One slot is shared by a manager and all of its connections. Assignment
//! is last-write-wins; each arrival reads whatever is assigned at that
//! moment.

use parking_lot::RwLock;
use std::sync::Arc;

/// Receives the trimmed text of one arrival event.
pub type Callback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Clone, Default)]
pub struct CallbackSlot {
    inner: Arc<RwLock<Option<Callback>>>,
}

impl CallbackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the callback.
    pub fn set<F>(&self, callback: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        *self.inner.write() = Some(Arc::new(callback));
    }

    /// Replace the callback with an already shared one.
    pub fn set_shared(&self, callback: Callback) {
        *self.inner.write() = Some(callback);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// The callback assigned right now.
    pub fn current(&self) -> Option<Callback> {
        self.inner.read().clone()
    }

    pub fn is_set(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl std::fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("set", &self.is_set())
            .finish()
    }
}
