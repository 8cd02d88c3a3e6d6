//! Recording doubles for the native boundary.

use std::collections::HashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use wvbridge_common::{Geometry, Handle, LoaderError};

use crate::abi::{AttachContext, ModuleProvider, NativeAbi, NavigationCallback, ProgressCallback};

#[derive(Debug, Clone, PartialEq)]
pub enum AbiCall {
    Initialize(AttachContext),
    SetProgressCallback(Handle),
    SetNavigationCallback(Handle),
    UpdateGeometry(Handle, Geometry),
    LoadUrl(Handle, String),
    Close(Handle),
}

type SharedProgress = Arc<dyn Fn(f32) + Send + Sync>;
type SharedNavigation = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// In-memory engine that records every call.
///
/// `initialize` returns the configured handle (`0` simulates failure).
/// Installed callbacks can be fired with [`emit_progress`](Self::emit_progress)
/// and [`emit_navigation`](Self::emit_navigation) from any thread.
pub struct MockAbi {
    next_handle: AtomicI64,
    calls: Mutex<Vec<AbiCall>>,
    progress: Mutex<HashMap<i64, SharedProgress>>,
    navigation: Mutex<HashMap<i64, SharedNavigation>>,
}

impl MockAbi {
    pub fn new(handle: i64) -> Self {
        Self {
            next_handle: AtomicI64::new(handle),
            calls: Mutex::new(Vec::new()),
            progress: Mutex::new(HashMap::new()),
            navigation: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_next_handle(&self, handle: i64) {
        self.next_handle.store(handle, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<AbiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&AbiCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(*c)).count()
    }

    pub fn close_count(&self) -> usize {
        self.count(|c| matches!(c, AbiCall::Close(_)))
    }

    /// Fire the progress callback installed for `handle`. Returns whether
    /// one was installed.
    pub fn emit_progress(&self, handle: i64, progress: f32) -> bool {
        let callback = self.progress.lock().unwrap().get(&handle).cloned();
        match callback {
            Some(cb) => {
                cb(progress);
                true
            }
            None => false,
        }
    }

    /// Ask the navigation callback installed for `handle`.
    pub fn emit_navigation(&self, handle: i64, url: &str) -> Option<bool> {
        let callback = self.navigation.lock().unwrap().get(&handle).cloned();
        callback.map(|cb| cb(url))
    }

    fn record(&self, call: AbiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NativeAbi for MockAbi {
    fn initialize(&self, context: &AttachContext) -> Handle {
        self.record(AbiCall::Initialize(*context));
        Handle::from_raw(self.next_handle.load(Ordering::SeqCst))
    }

    fn set_progress_callback(&self, handle: Handle, callback: ProgressCallback) {
        self.record(AbiCall::SetProgressCallback(handle));
        self.progress
            .lock()
            .unwrap()
            .insert(handle.raw(), Arc::from(callback));
    }

    fn set_navigation_callback(&self, handle: Handle, callback: NavigationCallback) {
        self.record(AbiCall::SetNavigationCallback(handle));
        self.navigation
            .lock()
            .unwrap()
            .insert(handle.raw(), Arc::from(callback));
    }

    fn update_geometry(&self, handle: Handle, geometry: Geometry) {
        self.record(AbiCall::UpdateGeometry(handle, geometry));
    }

    fn load_url(&self, handle: Handle, url: &CStr) {
        self.record(AbiCall::LoadUrl(handle, url.to_string_lossy().into_owned()));
    }

    fn close(&self, handle: Handle) {
        self.record(AbiCall::Close(handle));
        self.progress.lock().unwrap().remove(&handle.raw());
        self.navigation.lock().unwrap().remove(&handle.raw());
    }
}

/// Provider handing out one [`MockAbi`], counting how often it was asked.
pub struct MockProvider {
    abi: Arc<MockAbi>,
    failure: Option<LoaderError>,
    loads: AtomicUsize,
}

impl MockProvider {
    pub fn new(abi: Arc<MockAbi>) -> Self {
        Self {
            abi,
            failure: None,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: LoaderError) -> Self {
        Self {
            abi: Arc::new(MockAbi::new(0)),
            failure: Some(error),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModuleProvider for MockProvider {
    fn abi(&self) -> Result<Arc<dyn NativeAbi>, LoaderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(Arc::clone(&self.abi) as Arc<dyn NativeAbi>),
        }
    }
}
