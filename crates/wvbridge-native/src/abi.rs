//! Safe view of the engine's C entry points.

use std::ffi::CStr;
use std::sync::Arc;

use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use wvbridge_common::{BridgeError, Geometry, Handle, LoaderError};

/// Invoked with a load progress value in `0.0..=1.0`.
pub type ProgressCallback = Box<dyn Fn(f32) + Send + Sync>;

/// Invoked with a candidate URL; `true` allows the navigation.
pub type NavigationCallback = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// The engine's entry points, one method per C symbol.
///
/// Implementations never interpret a [`Handle`]. Callers guard every call
/// except [`initialize`](Self::initialize) on `handle.is_live()`. Callbacks
/// may fire on a thread the engine owns, never after `close` returns.
pub trait NativeAbi: Send + Sync {
    /// Create an engine instance attached to the host window. Must run on
    /// the host UI thread. Returns [`Handle::NONE`] on failure.
    fn initialize(&self, context: &AttachContext) -> Handle;

    fn set_progress_callback(&self, handle: Handle, callback: ProgressCallback);

    fn set_navigation_callback(&self, handle: Handle, callback: NavigationCallback);

    /// Push size and screen position. A state update, not a render.
    fn update_geometry(&self, handle: Handle, geometry: Geometry);

    fn load_url(&self, handle: Handle, url: &CStr);

    fn close(&self, handle: Handle);
}

/// Source of a loaded native module.
pub trait ModuleProvider: Send + Sync {
    /// Load the module if this has not happened yet and return its ABI.
    fn abi(&self) -> Result<Arc<dyn NativeAbi>, LoaderError>;
}

/// Window system a host window handle belongs to. The discriminant is the
/// `kind` argument of `wvbridge_init_and_attach`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WindowKind {
    Win32 = 1,
    AppKit = 2,
    Xlib = 3,
    Xcb = 4,
    Wayland = 5,
}

/// Host window the engine view is parented to.
///
/// Plain data so it can travel to the UI thread inside a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachContext {
    pub kind: WindowKind,
    pub window: u64,
}

impl AttachContext {
    pub const fn new(kind: WindowKind, window: u64) -> Self {
        Self { kind, window }
    }

    pub fn from_raw(handle: RawWindowHandle) -> Result<Self, BridgeError> {
        let (kind, window) = match handle {
            RawWindowHandle::Win32(h) => (WindowKind::Win32, h.hwnd.get() as u64),
            RawWindowHandle::AppKit(h) => (WindowKind::AppKit, h.ns_view.as_ptr() as usize as u64),
            RawWindowHandle::Xlib(h) => (WindowKind::Xlib, h.window as u64),
            RawWindowHandle::Xcb(h) => (WindowKind::Xcb, u64::from(h.window.get())),
            RawWindowHandle::Wayland(h) => {
                (WindowKind::Wayland, h.surface.as_ptr() as usize as u64)
            }
            other => return Err(BridgeError::UnsupportedWindow(format!("{other:?}"))),
        };
        Ok(Self { kind, window })
    }

    pub fn from_window<W: HasWindowHandle + ?Sized>(window: &W) -> Result<Self, BridgeError> {
        let handle = window
            .window_handle()
            .map_err(|e| BridgeError::UnsupportedWindow(e.to_string()))?;
        Self::from_raw(handle.as_raw())
    }
}
