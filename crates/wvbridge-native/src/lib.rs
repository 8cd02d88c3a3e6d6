//! Native engine boundary.
//!
//! Provides:
//! - The [`NativeAbi`] trait mirroring the engine's C entry points
//! - A `libloading` binding with panic-safe `extern "C"` trampolines
//! - Platform resolution and bundled library resources
//! - [`NativeModuleLoader`], which stages the bundled library in a temp
//!   file and loads it exactly once

pub mod abi;
pub mod library;
pub mod loader;
pub mod platform;
pub mod resources;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use abi::{
    AttachContext, ModuleProvider, NativeAbi, NavigationCallback, ProgressCallback, WindowKind,
};
pub use library::LibraryAbi;
pub use loader::{LoadedModule, NativeModuleLoader};
pub use platform::Platform;
pub use resources::{DirectoryResources, EmbeddedResources, ResourceSource};
