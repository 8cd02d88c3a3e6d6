//! One-time staging and loading of the bundled engine library.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};
use wvbridge_common::{LoaderError, ShutdownHooks};
use wvbridge_config::LoaderConfig;

use crate::abi::{ModuleProvider, NativeAbi};
use crate::library::LibraryAbi;
use crate::platform::Platform;
use crate::resources::ResourceSource;

type Opener = dyn Fn(&Path) -> Result<Arc<dyn NativeAbi>, LoaderError> + Send + Sync;

/// A native module resident in the process.
#[derive(Clone)]
pub struct LoadedModule {
    pub abi: Arc<dyn NativeAbi>,
    /// Staged temp file the module was loaded from.
    pub path: PathBuf,
    /// Resource name the bytes came from.
    pub resource: String,
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("path", &self.path)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

/// Stages the platform's bundled library in a temp file and loads it.
///
/// The first [`ensure_loaded`](Self::ensure_loaded) call does the work;
/// concurrent callers block until it finishes and every later call returns
/// the memoized outcome. A failure is never retried: a missing resource or
/// unsupported platform is a packaging defect.
pub struct NativeModuleLoader {
    source: Box<dyn ResourceSource>,
    config: LoaderConfig,
    platform: Option<Platform>,
    opener: Box<Opener>,
    hooks: &'static ShutdownHooks,
    module: OnceLock<Result<LoadedModule, LoaderError>>,
}

static PROCESS_LOADER: OnceLock<Arc<NativeModuleLoader>> = OnceLock::new();

impl NativeModuleLoader {
    pub fn new(source: impl ResourceSource + 'static, config: LoaderConfig) -> Self {
        Self {
            source: Box::new(source),
            config,
            platform: None,
            opener: Box::new(|path| Ok(Arc::new(LibraryAbi::open(path)?) as Arc<dyn NativeAbi>)),
            hooks: ShutdownHooks::global(),
            module: OnceLock::new(),
        }
    }

    /// Resolve resources for `platform` instead of the running OS.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Replace the step that turns the staged file into an ABI.
    pub fn with_opener<F>(mut self, opener: F) -> Self
    where
        F: Fn(&Path) -> Result<Arc<dyn NativeAbi>, LoaderError> + Send + Sync + 'static,
    {
        self.opener = Box::new(opener);
        self
    }

    /// Registry that receives the temp-file cleanup hook.
    pub fn with_shutdown_hooks(mut self, hooks: &'static ShutdownHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Make `loader` the process-wide loader. The first install wins; later
    /// calls return the already installed loader.
    pub fn install(loader: NativeModuleLoader) -> Arc<NativeModuleLoader> {
        Arc::clone(PROCESS_LOADER.get_or_init(|| Arc::new(loader)))
    }

    /// The process-wide loader, if one was installed.
    pub fn process() -> Option<Arc<NativeModuleLoader>> {
        PROCESS_LOADER.get().cloned()
    }

    pub fn platform(&self) -> Result<Platform, LoaderError> {
        match self.platform {
            Some(p) => Ok(p),
            None => Platform::current(),
        }
    }

    pub fn resource_name(&self) -> Result<String, LoaderError> {
        Ok(self.platform()?.resource_name(&self.config.library_name))
    }

    pub fn ensure_loaded(&self) -> Result<&LoadedModule, LoaderError> {
        match self.module.get_or_init(|| self.load()) {
            Ok(module) => Ok(module),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.module.get(), Some(Ok(_)))
    }

    fn load(&self) -> Result<LoadedModule, LoaderError> {
        let platform = self.platform()?;
        let resource = platform.resource_name(&self.config.library_name);
        info!(%platform, resource = %resource, "loading native module");

        let bytes = self
            .source
            .read(&resource)?
            .ok_or_else(|| LoaderError::ResourceMissing {
                name: resource.clone(),
                source_desc: self.source.describe(),
            })?;

        let path = self.stage(&bytes, platform)?;
        let abi = match (self.opener)(&path) {
            Ok(abi) => abi,
            Err(e) => {
                remove_staged(&path);
                return Err(e);
            }
        };

        // Registered only once the library is mapped: if shutdown has already
        // started the hook runs right away.
        let cleanup = path.clone();
        self.hooks
            .register("wvbridge-staged-library", move || remove_staged(&cleanup));
        info!(path = %path.display(), bytes = bytes.len(), "native module loaded");
        Ok(LoadedModule {
            abi,
            path,
            resource,
        })
    }

    fn stage(&self, bytes: &[u8], platform: Platform) -> Result<PathBuf, LoaderError> {
        let suffix = format!(".{}", platform.library_extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.config.temp_prefix).suffix(&suffix);
        let created = match &self.config.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        let mut file = created.map_err(|e| LoaderError::TempFile(e.to_string()))?;

        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| LoaderError::TempFile(e.to_string()))?;

        let path = file
            .into_temp_path()
            .keep()
            .map_err(|e| LoaderError::TempFile(e.to_string()))?;
        debug!(path = %path.display(), "staged native library");
        Ok(path)
    }
}

impl ModuleProvider for NativeModuleLoader {
    fn abi(&self) -> Result<Arc<dyn NativeAbi>, LoaderError> {
        self.ensure_loaded().map(|module| Arc::clone(&module.abi))
    }
}

fn remove_staged(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed staged native library"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "failed to remove staged native library"
        ),
    }
}
