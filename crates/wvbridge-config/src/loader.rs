//! TOML config file loading.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use wvbridge_common::ConfigError;

use crate::schema::BridgeConfig;
use crate::validation;

/// Load config from a specific TOML file path.
///
/// Missing fields take serde defaults. Validation problems are logged but
/// the parsed config is still returned; callers that need a hard failure
/// run [`validation::validate`] themselves.
pub fn load_from_path(path: &Path) -> Result<BridgeConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("failed to read {}: {e}", path.display())))?;

    let config: BridgeConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On Linux: `~/.config/wvbridge/config.toml`
/// On macOS: `~/Library/Application Support/wvbridge/config.toml`
///
/// A missing file yields the defaults; nothing is written to disk.
pub fn load_default() -> Result<BridgeConfig, ConfigError> {
    let path = default_config_path()?;

    match load_from_path(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => {
            info!("no config found at {}, using defaults", path.display());
            Ok(BridgeConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("wvbridge").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EvaluationPolicy, PendingUrlPolicy};

    #[test]
    fn load_from_nonexistent_returns_file_not_found() {
        let result = load_from_path(Path::new("/tmp/nonexistent_wvbridge_config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn load_valid_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[loader]
library_name = "webbridge"
resource_dir = "/opt/webbridge/natives"

[widget]
pending_url = "reject"
"#,
        )
        .unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.loader.library_name, "webbridge");
        assert_eq!(
            config.loader.resource_dir.as_deref(),
            Some(Path::new("/opt/webbridge/natives"))
        );
        assert_eq!(config.widget.pending_url, PendingUrlPolicy::Reject);
        // Defaults preserved
        assert_eq!(config.loader.temp_prefix, "wvbridge");
        assert_eq!(config.navigation.policy, EvaluationPolicy::EvaluateAll);
    }

    #[test]
    fn load_invalid_toml_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let result = load_from_path(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn invalid_values_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[loader]\nlibrary_name = \"\"\n").unwrap();

        let config = load_from_path(&path).unwrap();
        assert!(config.loader.library_name.is_empty());
        assert!(validation::validate(&config).is_err());
    }

    #[test]
    fn default_path_ends_with_config_toml() {
        if let Ok(path) = default_config_path() {
            assert!(path.ends_with("wvbridge/config.toml"));
        }
    }
}
