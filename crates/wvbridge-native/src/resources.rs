//! Bundled native library resources.

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wvbridge_common::LoaderError;

/// Lookup of bundled library bytes by file name.
pub trait ResourceSource: Send + Sync {
    /// `Ok(None)` when the resource does not exist.
    fn read(&self, name: &str) -> Result<Option<Cow<'static, [u8]>>, LoaderError>;

    /// Human-readable location, used in error messages.
    fn describe(&self) -> String;
}

/// Resources compiled into the host binary.
///
/// ```rust,ignore
/// static NATIVES: EmbeddedResources = EmbeddedResources::new(&[
///     ("libwvbridge.so", include_bytes!("../natives/libwvbridge.so")),
/// ]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedResources {
    entries: &'static [(&'static str, &'static [u8])],
}

impl EmbeddedResources {
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { entries }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

impl ResourceSource for EmbeddedResources {
    fn read(&self, name: &str) -> Result<Option<Cow<'static, [u8]>>, LoaderError> {
        Ok(self
            .entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, bytes)| Cow::Borrowed(*bytes)))
    }

    fn describe(&self) -> String {
        "embedded resources".to_string()
    }
}

/// Resources shipped next to the application in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceSource for DirectoryResources {
    fn read(&self, name: &str) -> Result<Option<Cow<'static, [u8]>>, LoaderError> {
        let path = self.root.join(name);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(Cow::Owned(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LoaderError::ResourceRead {
                name: name.to_string(),
                reason: format!("{}: {e}", path.display()),
            }),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
