//! Load progress fan-out.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{error, trace};

/// Receives load progress in `0.0..=1.0`.
///
/// Called on whatever thread the engine reports progress from, which is
/// usually not the host UI thread. Listeners that touch UI state must
/// reschedule onto the UI thread themselves.
///
/// The engine may report progress while the UI thread waits inside a native
/// call. Reading [`BridgeWidget::state`](crate::BridgeWidget::state) or
/// [`handle`](crate::BridgeWidget::handle) is fine; `load_url` and `close`
/// must go through [`UiExecutor::invoke_later`](crate::UiExecutor::invoke_later)
/// instead of being called from the listener.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, progress: f32);
}

impl<F> ProgressListener for F
where
    F: Fn(f32) + Send + Sync,
{
    fn on_progress(&self, progress: f32) {
        self(progress)
    }
}

/// Set of progress listeners keyed by `Arc` identity.
#[derive(Default)]
pub struct ProgressDispatcher {
    listeners: RwLock<Vec<Arc<dyn ProgressListener>>>,
}

impl ProgressDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if this exact listener is already registered.
    pub fn add(&self, listener: Arc<dyn ProgressListener>) -> bool {
        let mut listeners = self.write();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn remove(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        let mut listeners = self.write();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn contains(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        self.read().iter().any(|l| same_listener(l, listener))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// One fan-out pass over a snapshot of the listeners, so listeners may
    /// add or remove listeners (themselves included) while being notified.
    /// Returns the number of listeners invoked.
    pub fn notify(&self, progress: f32) -> usize {
        let progress = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        let snapshot: Vec<_> = self.read().clone();
        trace!(progress, listeners = snapshot.len(), "progress");
        for listener in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener.on_progress(progress))).is_err() {
                error!(progress, "progress listener panicked");
            }
        }
        snapshot.len()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn ProgressListener>>> {
        self.listeners.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn ProgressListener>>> {
        self.listeners.write().unwrap_or_else(|e| e.into_inner())
    }
}

pub(crate) fn same_listener<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
