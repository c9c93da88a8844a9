//! Error types for PM.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for PM operations.
pub type Result<T> = std::result::Result<T, PmError>;

/// Main error type for PM.
///
/// Plugin execution failures are not errors: they are terminal statuses on
/// the plugin result. Only conditions that abort a run before every plugin
/// reaches a terminal state surface here.
#[derive(Debug, Error)]
pub enum PmError {
    #[error("Library '{0}' doesn't exist. A valid plugins library path must be specified.")]
    MissingLibrary(PathBuf),

    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{0}' is a directory; expected a plugin list file or inline JSON")]
    PluginListIsDir(PathBuf),

    #[error("Failed to decode plugin list: {0}")]
    Decode(String),

    #[error("Duplicate plugin name '{0}'")]
    DuplicatePlugin(String),

    #[error(
        "There is either a circular dependency between plugins, \
         or some dependencies are missing in these plugins: [{}]",
        .0.join(", ")
    )]
    DependencyValidation(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
