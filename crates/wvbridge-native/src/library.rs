//! `libloading` binding of the engine's C symbols.

use std::borrow::Cow;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use libloading::Library;
use tracing::{debug, error};
use wvbridge_common::{Geometry, Handle, LoaderError};

use crate::abi::{AttachContext, NativeAbi, NavigationCallback, ProgressCallback};

pub const SYM_INIT_AND_ATTACH: &str = "wvbridge_init_and_attach";
pub const SYM_SET_PROGRESS_CALLBACK: &str = "wvbridge_set_progress_callback";
pub const SYM_SET_NAVIGATION_CALLBACK: &str = "wvbridge_set_navigation_callback";
pub const SYM_UPDATE: &str = "wvbridge_update";
pub const SYM_LOAD_URL: &str = "wvbridge_load_url";
pub const SYM_CLOSE: &str = "wvbridge_close";

type ProgressTrampoline = unsafe extern "C" fn(*mut c_void, f32);
type NavigationTrampoline = unsafe extern "C" fn(*mut c_void, *const c_char) -> bool;

type InitAndAttachFn = unsafe extern "C" fn(u32, u64) -> i64;
type SetProgressCallbackFn = unsafe extern "C" fn(i64, ProgressTrampoline, *mut c_void);
type SetNavigationCallbackFn = unsafe extern "C" fn(i64, NavigationTrampoline, *mut c_void);
type UpdateFn = unsafe extern "C" fn(i64, i32, i32, i32, i32);
type LoadUrlFn = unsafe extern "C" fn(i64, *const c_char);
type CloseFn = unsafe extern "C" fn(i64);

struct Symbols {
    init_and_attach: InitAndAttachFn,
    set_progress_callback: SetProgressCallbackFn,
    set_navigation_callback: SetNavigationCallbackFn,
    update: UpdateFn,
    load_url: LoadUrlFn,
    close: CloseFn,
}

impl Symbols {
    /// # Safety
    /// The library must export the symbols with the signatures above.
    unsafe fn resolve(library: &Library) -> Result<Self, LoaderError> {
        unsafe {
            Ok(Self {
                init_and_attach: symbol(library, SYM_INIT_AND_ATTACH)?,
                set_progress_callback: symbol(library, SYM_SET_PROGRESS_CALLBACK)?,
                set_navigation_callback: symbol(library, SYM_SET_NAVIGATION_CALLBACK)?,
                update: symbol(library, SYM_UPDATE)?,
                load_url: symbol(library, SYM_LOAD_URL)?,
                close: symbol(library, SYM_CLOSE)?,
            })
        }
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> Result<T, LoaderError> {
    let sym: libloading::Symbol<'_, T> = unsafe { library.get(name.as_bytes()) }
        .map_err(|_| LoaderError::MissingSymbol(name.to_string()))?;
    Ok(*sym)
}

/// Callbacks handed to the engine for one handle. The engine holds raw
/// pointers into these boxes until `close` returns for that handle.
#[derive(Default)]
struct InstalledCallbacks {
    progress: Option<Box<ProgressCallback>>,
    navigation: Option<Box<NavigationCallback>>,
}

/// The engine module loaded from disk.
///
/// Function pointers are copied out of the library at open time and stay
/// valid for as long as this value lives; the library is unloaded last.
pub struct LibraryAbi {
    symbols: Symbols,
    callbacks: Mutex<HashMap<i64, InstalledCallbacks>>,
    _library: Library,
}

impl LibraryAbi {
    pub fn open(path: &Path) -> Result<Self, LoaderError> {
        // SAFETY: running the library's initializers is the point of loading
        // the bundled engine bridge.
        let library = unsafe { Library::new(path) }.map_err(|e| LoaderError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        // SAFETY: the bundled library is built against this symbol table.
        let symbols = unsafe { Symbols::resolve(&library)? };
        debug!(path = %path.display(), "native symbols resolved");
        Ok(Self {
            symbols,
            callbacks: Mutex::new(HashMap::new()),
            _library: library,
        })
    }

    fn callbacks(&self) -> MutexGuard<'_, HashMap<i64, InstalledCallbacks>> {
        self.callbacks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl NativeAbi for LibraryAbi {
    fn initialize(&self, context: &AttachContext) -> Handle {
        // SAFETY: plain integer arguments; called on the host UI thread.
        let raw = unsafe { (self.symbols.init_and_attach)(context.kind as u32, context.window) };
        Handle::from_raw(raw)
    }

    fn set_progress_callback(&self, handle: Handle, callback: ProgressCallback) {
        if !handle.is_live() {
            return;
        }
        let boxed = Box::new(callback);
        let user = &*boxed as *const ProgressCallback as *mut c_void;
        let mut callbacks = self.callbacks();
        // SAFETY: `user` stays valid until close returns for this handle.
        unsafe { (self.symbols.set_progress_callback)(handle.raw(), progress_trampoline, user) };
        let previous = callbacks.entry(handle.raw()).or_default().progress.replace(boxed);
        drop(callbacks);
        drop(previous);
    }

    fn set_navigation_callback(&self, handle: Handle, callback: NavigationCallback) {
        if !handle.is_live() {
            return;
        }
        let boxed = Box::new(callback);
        let user = &*boxed as *const NavigationCallback as *mut c_void;
        let mut callbacks = self.callbacks();
        // SAFETY: `user` stays valid until close returns for this handle.
        unsafe {
            (self.symbols.set_navigation_callback)(handle.raw(), navigation_trampoline, user)
        };
        let previous = callbacks.entry(handle.raw()).or_default().navigation.replace(boxed);
        drop(callbacks);
        drop(previous);
    }

    fn update_geometry(&self, handle: Handle, geometry: Geometry) {
        if !handle.is_live() {
            return;
        }
        // SAFETY: plain integer arguments on a live handle.
        unsafe {
            (self.symbols.update)(
                handle.raw(),
                geometry.width,
                geometry.height,
                geometry.screen_x,
                geometry.screen_y,
            )
        };
    }

    fn load_url(&self, handle: Handle, url: &CStr) {
        if !handle.is_live() {
            return;
        }
        // SAFETY: the engine copies the NUL-terminated string before returning.
        unsafe { (self.symbols.load_url)(handle.raw(), url.as_ptr()) };
    }

    fn close(&self, handle: Handle) {
        if !handle.is_live() {
            return;
        }
        // SAFETY: live handle; no callbacks fire once this returns.
        unsafe { (self.symbols.close)(handle.raw()) };
        let released = self.callbacks().remove(&handle.raw());
        drop(released);
    }
}

unsafe extern "C" fn progress_trampoline(user: *mut c_void, progress: f32) {
    if user.is_null() {
        return;
    }
    // SAFETY: `user` was produced from a live `Box<ProgressCallback>`.
    let callback = unsafe { &*(user as *const ProgressCallback) };
    if catch_unwind(AssertUnwindSafe(|| callback(progress))).is_err() {
        error!(progress, "progress callback panicked");
    }
}

unsafe extern "C" fn navigation_trampoline(user: *mut c_void, url: *const c_char) -> bool {
    if user.is_null() {
        return true;
    }
    // SAFETY: `user` was produced from a live `Box<NavigationCallback>`.
    let callback = unsafe { &*(user as *const NavigationCallback) };
    let url = if url.is_null() {
        Cow::Borrowed("")
    } else {
        // SAFETY: the engine passes a NUL-terminated string valid for this call.
        unsafe { CStr::from_ptr(url) }.to_string_lossy()
    };
    match catch_unwind(AssertUnwindSafe(|| callback(url.as_ref()))) {
        Ok(allow) => allow,
        Err(_) => {
            error!(url = %url, "navigation callback panicked, allowing");
            true
        }
    }
}
