//! Attach, geometry, navigation and teardown against the native ABI.

use std::ffi::CString;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, error, info, trace};
use wvbridge_common::{BridgeError, Geometry, Handle};
use wvbridge_config::PendingUrlPolicy;
use wvbridge_native::{AttachContext, NativeAbi};

use super::{lock, BridgeWidget, LifecycleState, WidgetShared};

// =============================================================================
// ATTACH
// =============================================================================

impl WidgetShared {
    pub(super) fn request_attach(self: &Arc<Self>, context: AttachContext) -> bool {
        if let Err(current) = self.state.compare_exchange(
            LifecycleState::Uninitialized as u8,
            LifecycleState::Attaching as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            let state = LifecycleState::from_u8(current);
            debug!(widget = %self.id, ?state, "displayable signal ignored");
            return false;
        }

        debug!(widget = %self.id, ?context, "attach scheduled");
        let weak = Arc::downgrade(self);
        self.executor.invoke_later(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.complete_attach(context);
            }
        }));
        true
    }

    /// Runs on the UI thread.
    fn complete_attach(self: &Arc<Self>, context: AttachContext) {
        match self.attach_native(context) {
            Ok(true) => self.after_attach(),
            Ok(false) => {}
            Err(e) => {
                error!(widget = %self.id, error = %e, "attach failed");
                *lock(&self.attach_error) = Some(e);
            }
        }
    }

    /// Create the handle, install the trampolines and load any URL queued
    /// before attach. `Ok(false)` means a close arrived first and the attach
    /// was abandoned.
    fn attach_native(&self, context: AttachContext) -> Result<bool, BridgeError> {
        let mut native = lock(&self.native);
        if self.state() != LifecycleState::Attaching {
            debug!(widget = %self.id, state = ?self.state(), "attach cancelled");
            return Ok(false);
        }

        let abi = match self.provider.abi() {
            Ok(abi) => abi,
            Err(e) => {
                self.set_state(LifecycleState::Uninitialized);
                return Err(e.into());
            }
        };

        let handle = abi.initialize(&context);
        if !handle.is_live() {
            self.set_state(LifecycleState::Uninitialized);
            return Err(BridgeError::AttachFailed);
        }

        let progress = Arc::clone(&self.progress);
        abi.set_progress_callback(
            handle,
            Box::new(move |value: f32| {
                progress.notify(value);
            }),
        );
        let navigation = Arc::clone(&self.navigation);
        abi.set_navigation_callback(
            handle,
            Box::new(move |url: &str| navigation.decide(url).is_allowed()),
        );

        let abi = native.insert(abi);
        self.handle.store(handle.raw(), Ordering::Release);
        self.set_state(LifecycleState::Attached);
        info!(widget = %self.id, %handle, "attached");

        let pending = lock(&self.pending_url).take();
        if let Some(url) = pending {
            debug!(widget = %self.id, url = ?url, "loading url queued before attach");
            abi.load_url(handle, &url);
        }
        Ok(true)
    }

    fn after_attach(self: &Arc<Self>) {
        let initializer = lock(&self.initializer).take();
        if let Some(initializer) = initializer {
            initializer(&BridgeWidget {
                shared: Arc::clone(self),
            });
        }

        let weak = Arc::downgrade(self);
        self.executor.invoke_later(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.push_geometry();
            }
        }));
    }

    fn set_state(&self, state: LifecycleState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

// =============================================================================
// GEOMETRY AND NAVIGATION
// =============================================================================

impl WidgetShared {
    fn push_geometry(&self) {
        let geometry = *lock(&self.geometry);
        if self
            .with_live(|abi, handle| abi.update_geometry(handle, geometry))
            .is_some()
        {
            debug!(widget = %self.id, ?geometry, "initial geometry pushed");
        }
    }

    pub(super) fn geometry_changed(&self, geometry: Geometry) {
        *lock(&self.geometry) = geometry;
        if self
            .with_live(|abi, handle| abi.update_geometry(handle, geometry))
            .is_none()
        {
            trace!(widget = %self.id, ?geometry, "geometry recorded before attach");
        }
    }

    pub(super) fn load_url(&self, url: &str) -> Result<(), BridgeError> {
        let c_url = CString::new(url).map_err(|_| BridgeError::InvalidUrl(url.to_string()))?;
        let native = lock(&self.native);
        match self.state() {
            LifecycleState::Attached => {
                let handle = self.handle();
                match native.as_deref() {
                    Some(abi) if handle.is_live() => {
                        debug!(widget = %self.id, url, "load url");
                        abi.load_url(handle, &c_url);
                        Ok(())
                    }
                    _ => Err(BridgeError::Closed),
                }
            }
            LifecycleState::Closed => Err(BridgeError::Closed),
            LifecycleState::Uninitialized | LifecycleState::Attaching => {
                match self.settings.pending_url {
                    PendingUrlPolicy::Queue => {
                        debug!(widget = %self.id, url, "url queued until attach");
                        *lock(&self.pending_url) = Some(c_url);
                        Ok(())
                    }
                    PendingUrlPolicy::Reject => Err(BridgeError::NotAttached),
                }
            }
        }
    }

    /// Run `f` with the live handle while holding the call lock, or return
    /// `None` if there is no live handle.
    fn with_live<R>(&self, f: impl FnOnce(&dyn NativeAbi, Handle) -> R) -> Option<R> {
        let native = lock(&self.native);
        let handle = self.handle();
        if !handle.is_live() {
            return None;
        }
        let abi = native.as_deref()?;
        Some(f(abi, handle))
    }
}

// =============================================================================
// CLOSE
// =============================================================================

impl WidgetShared {
    /// Single teardown path. Swapping the handle to zero under the call lock
    /// decides which caller performs the native close; everyone else is a
    /// no-op.
    pub(super) fn close(&self) -> bool {
        let mut native = lock(&self.native);
        let previous = self
            .state
            .swap(LifecycleState::Closed as u8, Ordering::AcqRel);
        let previous = LifecycleState::from_u8(previous);
        let handle = Handle::from_raw(self.handle.swap(Handle::NONE.raw(), Ordering::AcqRel));
        let abi = native.take();

        if previous != LifecycleState::Closed {
            if let Some(hook) = lock(&self.shutdown_hook).take() {
                self.hooks.unregister(hook);
            }
            lock(&self.pending_url).take();
        }

        match abi {
            Some(abi) if handle.is_live() => {
                abi.close(handle);
                info!(widget = %self.id, %handle, "closed");
                true
            }
            _ => {
                if previous != LifecycleState::Closed {
                    debug!(widget = %self.id, state = ?previous, "closed without a native handle");
                }
                false
            }
        }
    }
}
