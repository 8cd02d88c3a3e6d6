//! The bridge widget: one native engine handle bound to one host widget.
//!
//! The host toolkit drives the widget with three signals:
//! [`on_displayable`](BridgeWidget::on_displayable) when it is mounted in a
//! visible window, [`on_geometry_changed`](BridgeWidget::on_geometry_changed)
//! on every resize or move, and [`on_removed`](BridgeWidget::on_removed) when
//! it leaves the window tree for good. Removal, an explicit
//! [`close`](BridgeWidget::close), process shutdown and dropping the last
//! widget value all funnel into the same idempotent teardown.
//!
//! Engine callbacks may fire on the engine's own thread while the UI thread
//! is blocked inside a native call. [`state`](BridgeWidget::state) and
//! [`handle`](BridgeWidget::handle) never block. Everything that calls into
//! the engine waits for the call already in flight.

use std::ffi::CString;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use raw_window_handle::HasWindowHandle;
use tracing::debug;
use wvbridge_common::{BridgeError, Geometry, Handle, HookId, ShutdownHooks, WidgetId};
use wvbridge_native::{AttachContext, ModuleProvider, NativeAbi};

use crate::executor::UiExecutor;
use crate::navigation::{NavigationDispatcher, NavigationHandler};
use crate::progress::{ProgressDispatcher, ProgressListener};

mod lifecycle;
mod types;


pub use types::{LifecycleState, WidgetSettings};

type Initializer = Box<dyn FnOnce(&BridgeWidget) + Send>;

pub(crate) struct WidgetShared {
    id: WidgetId,
    provider: Arc<dyn ModuleProvider>,
    executor: Arc<dyn UiExecutor>,
    settings: WidgetSettings,
    /// [`LifecycleState`] as `u8`. Written only while `native` is held,
    /// except for the lock-free `Uninitialized -> Attaching` claim.
    state: AtomicU8,
    /// Raw [`Handle`]. Written only while `native` is held; read lock-free
    /// so engine callbacks can observe it during a native call.
    handle: AtomicI64,
    /// The attached ABI. Held across every foreign call, which serializes
    /// them against close.
    native: Mutex<Option<Arc<dyn NativeAbi>>>,
    /// Latest geometry reported by the host, pushed again after attach.
    geometry: Mutex<Geometry>,
    pending_url: Mutex<Option<CString>>,
    initializer: Mutex<Option<Initializer>>,
    attach_error: Mutex<Option<BridgeError>>,
    progress: Arc<ProgressDispatcher>,
    navigation: Arc<NavigationDispatcher>,
    hooks: &'static ShutdownHooks,
    shutdown_hook: Mutex<Option<HookId>>,
}

/// Host-facing handle to a native web view.
///
/// Cloning yields another handle to the same widget. The native view is
/// closed when the last handle is dropped, unless it was closed earlier.
#[derive(Clone)]
pub struct BridgeWidget {
    shared: Arc<WidgetShared>,
}

impl BridgeWidget {
    /// Create a widget whose shutdown hook lives in the process-wide registry.
    pub fn new(
        provider: Arc<dyn ModuleProvider>,
        executor: Arc<dyn UiExecutor>,
        settings: WidgetSettings,
    ) -> Self {
        Self::with_hooks(provider, executor, settings, ShutdownHooks::global())
    }

    pub fn with_hooks(
        provider: Arc<dyn ModuleProvider>,
        executor: Arc<dyn UiExecutor>,
        settings: WidgetSettings,
        hooks: &'static ShutdownHooks,
    ) -> Self {
        let shared = Arc::new(WidgetShared {
            id: WidgetId::new(),
            provider,
            executor,
            settings,
            state: AtomicU8::new(LifecycleState::Uninitialized as u8),
            handle: AtomicI64::new(Handle::NONE.raw()),
            native: Mutex::new(None),
            geometry: Mutex::new(Geometry::default()),
            pending_url: Mutex::new(None),
            initializer: Mutex::new(None),
            attach_error: Mutex::new(None),
            progress: Arc::new(ProgressDispatcher::new()),
            navigation: Arc::new(NavigationDispatcher::new(settings.navigation_policy)),
            hooks,
            shutdown_hook: Mutex::new(None),
        });

        let weak = Arc::downgrade(&shared);
        let hook = hooks.register("wvbridge-widget-close", move || {
            if let Some(shared) = weak.upgrade() {
                shared.close();
            }
        });
        *lock(&shared.shutdown_hook) = Some(hook);

        debug!(widget = %shared.id, "widget created");
        Self { shared }
    }

    pub fn id(&self) -> WidgetId {
        self.shared.id
    }

    /// Lock-free; safe to call from engine callbacks.
    pub fn state(&self) -> LifecycleState {
        self.shared.state()
    }

    /// The native handle, [`Handle::NONE`] unless attached. Lock-free.
    pub fn handle(&self) -> Handle {
        self.shared.handle()
    }

    /// Latest geometry reported by the host.
    pub fn geometry(&self) -> Geometry {
        *lock(&self.shared.geometry)
    }

    /// Run `initializer` once on the UI thread right after the native view
    /// is attached, before the first geometry push.
    pub fn on_attached<F>(&self, initializer: F)
    where
        F: FnOnce(&BridgeWidget) + Send + 'static,
    {
        *lock(&self.shared.initializer) = Some(Box::new(initializer));
    }

    /// The host mounted the widget in a visible window.
    ///
    /// Schedules the native attach on the UI executor and returns `true`;
    /// returns `false` when the widget is already attaching, attached or
    /// closed.
    pub fn on_displayable(&self, context: AttachContext) -> bool {
        self.shared.request_attach(context)
    }

    /// [`on_displayable`](Self::on_displayable) for a window exposing a
    /// `raw-window-handle`.
    pub fn on_displayable_window<W>(&self, window: &W) -> Result<bool, BridgeError>
    where
        W: HasWindowHandle + ?Sized,
    {
        Ok(self.on_displayable(AttachContext::from_window(window)?))
    }

    /// The host resized or moved the widget.
    ///
    /// Forwarded to the engine once attached. Before that the value is kept
    /// and pushed right after attach.
    pub fn on_geometry_changed(&self, geometry: Geometry) {
        self.shared.geometry_changed(geometry);
    }

    /// The host removed the widget from its window tree permanently.
    pub fn on_removed(&self) {
        self.shared.close();
    }

    /// Navigate to `url`.
    ///
    /// Before attach the URL is queued or rejected per
    /// [`WidgetSettings::pending_url`]. After close this fails with
    /// [`BridgeError::Closed`].
    pub fn load_url(&self, url: &str) -> Result<(), BridgeError> {
        self.shared.load_url(url)
    }

    /// Release the native view. Returns whether this call closed a live
    /// handle; repeated calls are no-ops.
    pub fn close(&self) -> bool {
        self.shared.close()
    }

    /// Error from the most recent asynchronous attach attempt, if any.
    pub fn take_attach_error(&self) -> Option<BridgeError> {
        lock(&self.shared.attach_error).take()
    }

    pub fn add_progress_listener(&self, listener: Arc<dyn ProgressListener>) -> bool {
        self.shared.progress.add(listener)
    }

    pub fn remove_progress_listener(&self, listener: &Arc<dyn ProgressListener>) -> bool {
        self.shared.progress.remove(listener)
    }

    pub fn add_navigation_handler(
        &self,
        priority: i32,
        handler: Arc<dyn NavigationHandler>,
    ) -> bool {
        self.shared.navigation.add(priority, handler)
    }

    pub fn remove_navigation_handler(
        &self,
        priority: i32,
        handler: &Arc<dyn NavigationHandler>,
    ) -> bool {
        self.shared.navigation.remove(priority, handler)
    }

    pub fn progress(&self) -> &ProgressDispatcher {
        &self.shared.progress
    }

    pub fn navigation(&self) -> &NavigationDispatcher {
        &self.shared.navigation
    }
}

impl WidgetShared {
    fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn handle(&self) -> Handle {
        Handle::from_raw(self.handle.load(Ordering::Acquire))
    }
}

impl Drop for WidgetShared {
    fn drop(&mut self) {
        self.close();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
