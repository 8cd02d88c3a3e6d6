//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub loader: LoaderConfig,
    pub navigation: NavigationConfig,
    pub widget: WidgetConfig,
    pub logging: LoggingConfig,
}

/// Where the bundled native library comes from and where it is staged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Base library name; `wvbridge` resolves to `libwvbridge.so`,
    /// `libwvbridge.dylib` or `wvbridge.dll`.
    pub library_name: String,
    /// Prefix of the staged temp file.
    pub temp_prefix: String,
    /// Directory for the staged temp file. `None` uses the OS temp dir.
    pub temp_dir: Option<PathBuf>,
    /// Directory holding the per-platform libraries. `None` means the
    /// host supplies embedded resources.
    pub resource_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            library_name: "wvbridge".to_string(),
            temp_prefix: "wvbridge".to_string(),
            temp_dir: None,
            resource_dir: None,
        }
    }
}

/// How a navigation decision walks the registered handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPolicy {
    /// Every handler sees every navigation, even after one has denied it.
    #[default]
    EvaluateAll,
    /// Stop at the first handler that denies.
    ShortCircuit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub policy: EvaluationPolicy,
}

/// What `load_url` does before the native handle exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingUrlPolicy {
    /// Keep the most recent URL and load it once attached.
    #[default]
    Queue,
    /// Fail with `BridgeError::NotAttached`.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub pending_url: PendingUrlPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "wvbridge=info".to_string(),
        }
    }
}
