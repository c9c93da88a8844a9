//! Plugin data model: declared attributes, per-plugin results, and the
//! top-level run status document.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Execution state of a plugin.
///
/// `Succeeded`, `Failed` and `Skipped` are terminal; a plugin enters a
/// terminal state exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginStatus {
    Starting,
    Succeeded,
    Failed,
    Skipped,
}

impl PluginStatus {
    /// Returns true for the states a plugin can end in.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PluginStatus::Starting)
    }
}

impl fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PluginStatus::Starting => "Starting",
            PluginStatus::Succeeded => "Succeeded",
            PluginStatus::Failed => "Failed",
            PluginStatus::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

/// The static, declared properties of one plugin.
///
/// When loaded from a library directory the name is
/// `"<component-dir>/<file-basename>"`. Serialized field names follow the
/// descriptor-list document format (`Name`, `ExecStart`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PluginAttributes {
    /// Stable identifier, unique within an invocation.
    pub name: String,

    /// Human-readable label used in console output and graph node labels.
    pub description: String,

    /// Command line to run; empty means "succeed without executing".
    pub exec_start: String,

    /// Plugins that must complete successfully before this one may start.
    pub requires: Vec<String>,

    /// Plugins for which this one is a prerequisite (inverse of `requires`).
    pub required_by: Vec<String>,
}

impl PluginAttributes {
    /// Creates attributes with the given name and everything else empty.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the command line.
    pub fn with_exec_start(mut self, exec_start: impl Into<String>) -> Self {
        self.exec_start = exec_start.into();
        self
    }

    /// Sets the `Requires` relation.
    pub fn with_requires(mut self, requires: Vec<String>) -> Self {
        self.requires = requires;
        self
    }

    /// Sets the `RequiredBy` relation.
    pub fn with_required_by(mut self, required_by: Vec<String>) -> Self {
        self.required_by = required_by;
        self
    }
}

/// The dynamic outcome of one plugin: its attributes plus the terminal
/// status and captured output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginResult {
    #[serde(flatten)]
    pub attributes: PluginAttributes,

    #[serde(rename = "Status")]
    pub status: PluginStatus,

    /// Combined standard output and error of the plugin command.
    #[serde(rename = "StdOutErr", default)]
    pub stdouterr: String,
}

impl PluginResult {
    /// Creates a result entry for a plugin that has just been dispatched.
    pub fn starting(attributes: PluginAttributes) -> Self {
        Self {
            attributes,
            status: PluginStatus::Starting,
            stdouterr: String::new(),
        }
    }
}

/// Top-level result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// The plugin-type tag the invocation was scoped to.
    #[serde(rename = "Type", default)]
    pub type_tag: String,

    /// Per-plugin results, in the order plugins were scheduled.
    #[serde(rename = "Plugins", default)]
    pub plugins: Vec<PluginResult>,

    /// Overall verdict: `Succeeded` iff every child is `Succeeded`.
    #[serde(rename = "Status")]
    pub status: PluginStatus,

    /// Top-level diagnostic for errors that prevent the run from starting.
    #[serde(rename = "StdOutErr", default)]
    pub stdouterr: String,
}

impl RunStatus {
    /// Creates an empty run status for the given plugin type.
    pub fn new(type_tag: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            plugins: Vec::new(),
            status: PluginStatus::Starting,
            stdouterr: String::new(),
        }
    }
}
