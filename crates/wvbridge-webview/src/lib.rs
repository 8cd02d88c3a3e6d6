//! Native web view embedded as a host toolkit widget.
//!
//! Provides:
//! - [`BridgeWidget`], which owns one native engine handle and keeps it in
//!   step with the host widget's displayable/geometry/removal signals
//! - [`ProgressDispatcher`] fanning load progress out to listeners
//! - [`NavigationDispatcher`] resolving navigation attempts across
//!   priority-ordered handlers
//! - [`UiExecutor`] for scheduling work back onto the host UI thread

pub mod executor;
pub mod navigation;
pub mod progress;
pub mod widget;

pub use executor::{InlineExecutor, Task, TaskQueue, UiExecutor};
pub use navigation::{NavigationDispatcher, NavigationHandler, PrefixAllowlist, DEFAULT_PRIORITY};
pub use progress::{ProgressDispatcher, ProgressListener};
pub use widget::{BridgeWidget, LifecycleState, WidgetSettings};
