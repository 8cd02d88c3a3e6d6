pub mod errors;
pub mod id;
pub mod shutdown;
pub mod types;

pub use errors::{BridgeError, ConfigError, LoaderError, WvBridgeError};
pub use id::WidgetId;
pub use shutdown::{HookId, ShutdownGuard, ShutdownHooks};
pub use types::{Geometry, Handle, NavigationDecision};

pub type Result<T> = std::result::Result<T, WvBridgeError>;
