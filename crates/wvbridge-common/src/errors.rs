use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures while bringing the native module into the process.
///
/// Every variant indicates a packaging or environment defect. The loader
/// memoizes the first outcome, so the error is `Clone` and is handed out
/// again to every later caller instead of retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoaderError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("native library resource {name} not found in {source_desc}")]
    ResourceMissing { name: String, source_desc: String },

    #[error("failed to read native library resource {name}: {reason}")]
    ResourceRead { name: String, reason: String },

    #[error("failed to stage native library in temp file: {0}")]
    TempFile(String),

    #[error("failed to load native library {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("native library is missing symbol {0}")]
    MissingSymbol(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("native initialize returned an empty handle")]
    AttachFailed,

    #[error("widget is not attached yet")]
    NotAttached,

    #[error("widget is closed")]
    Closed,

    #[error("invalid url {0:?}: contains an interior NUL byte")]
    InvalidUrl(String),

    #[error("unsupported window handle: {0}")]
    UnsupportedWindow(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WvBridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("loader.library_name is empty".into());
        assert_eq!(
            err.to_string(),
            "config validation error: loader.library_name is empty"
        );
    }

    #[test]
    fn loader_error_display() {
        let err = LoaderError::ResourceMissing {
            name: "libwvbridge.so".into(),
            source_desc: "embedded resources".into(),
        };
        assert_eq!(
            err.to_string(),
            "native library resource libwvbridge.so not found in embedded resources"
        );

        let err = LoaderError::MissingSymbol("wvbridge_close".into());
        assert_eq!(err.to_string(), "native library is missing symbol wvbridge_close");
    }

    #[test]
    fn loader_error_is_clone_and_comparable() {
        let err = LoaderError::UnsupportedPlatform("plan9".into());
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn bridge_error_from_loader() {
        let bridge: BridgeError = LoaderError::UnsupportedPlatform("plan9".into()).into();
        assert!(matches!(bridge, BridgeError::Loader(_)));
        assert!(bridge.to_string().contains("plan9"));
    }

    #[test]
    fn umbrella_error_conversions() {
        let err: WvBridgeError = BridgeError::Closed.into();
        assert!(matches!(err, WvBridgeError::Bridge(_)));
        assert_eq!(err.to_string(), "widget is closed");

        let err: WvBridgeError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, WvBridgeError::Config(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: WvBridgeError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }
}
