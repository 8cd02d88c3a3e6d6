//! wvbridge configuration.
//!
//! TOML-based configuration for the native module loader, navigation
//! dispatch and widget lifecycle. Every section uses serde defaults, so an
//! empty or partial file is valid.
//!
//! ```rust,no_run
//! use wvbridge_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("{}", config.loader.library_name);
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{default_config_path, load_default, load_from_path};
pub use schema::{
    BridgeConfig, EvaluationPolicy, LoaderConfig, LoggingConfig, NavigationConfig,
    PendingUrlPolicy, WidgetConfig,
};

use wvbridge_common::ConfigError;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    let config = loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &BridgeConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&BridgeConfig::default());
        assert!(json.contains("\"loader\""));
        assert!(json.contains("\"navigation\""));
        assert!(json.contains("\"widget\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn config_to_json_uses_snake_case_policies() {
        let json = config_to_json(&BridgeConfig::default());
        assert!(json.contains("\"evaluate_all\""));
        assert!(json.contains("\"queue\""));
    }
}
