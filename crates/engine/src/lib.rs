//! PM Engine - Dependency resolution and concurrent plugin execution for
//! the Plugin Manager (PM).

mod executor;
mod normalize;
mod notifier;
mod validate;

pub use executor::{Executor, PluginCallback, PluginEvent};
pub use normalize::normalize;
pub use notifier::{GraphNotifier, NoopNotifier};
pub use validate::validate_dependencies;
