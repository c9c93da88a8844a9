//! State-change notifications consumed by the graph renderer.

use pm_core::{PluginAttributes, PluginStatus};

/// Receives plugin state changes during a run.
///
/// `init` is called once with the full normalized plugin set before
/// anything executes; `update` fires at each state change (`Starting` at
/// dispatch, then exactly one terminal status, with `url` pointing at the
/// plugin's log file when one was written). Calls are made from the
/// scheduler only and must be idempotent. Implementations are shared
/// across the run and use interior mutability.
pub trait GraphNotifier: Send + Sync {
    fn init(&self, plugin_type: &str, plugins: &[PluginAttributes]);

    fn update(&self, plugin_type: &str, plugin: &str, status: PluginStatus, url: &str);
}

/// Notifier that discards every notification.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl GraphNotifier for NoopNotifier {
    fn init(&self, _plugin_type: &str, _plugins: &[PluginAttributes]) {}

    fn update(&self, _plugin_type: &str, _plugin: &str, _status: PluginStatus, _url: &str) {}
}
