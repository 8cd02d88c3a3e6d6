//! Configuration validation.

use crate::schema::BridgeConfig;
use wvbridge_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BridgeConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_file_stem(&mut errors, "loader.library_name", &config.loader.library_name);
    validate_file_stem(&mut errors, "loader.temp_prefix", &config.loader.temp_prefix);

    if let Some(dir) = &config.loader.resource_dir {
        if dir.as_os_str().is_empty() {
            errors.push("loader.resource_dir is empty".to_string());
        }
    }

    if config.logging.level.trim().is_empty() {
        errors.push("logging.level is empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_file_stem(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{field} is empty"));
    } else if value.contains(['/', '\\']) {
        errors.push(format!("{field} must not contain path separators (got {value:?})"));
    }
}
