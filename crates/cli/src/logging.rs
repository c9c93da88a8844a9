//! Per-invocation log file setup.
//!
//! Every invocation gets its own timestamped main log file; the graph
//! artifacts (`.dot`, `.svg`) share the same timestamped stem so all
//! output of one run sits next to each other.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, SecondsFormat};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filenames derived for one invocation.
#[derive(Debug, Clone)]
pub struct LogPaths {
    /// The main log file, `<log dir>/<stem>.<timestamp>.log`.
    pub log_file: PathBuf,

    /// Timestamped stem shared with the graph artifacts, as a full path
    /// without extension.
    pub artifact_stem: String,
}

impl LogPaths {
    /// Computes the per-invocation file names. A `.log` suffix on the
    /// configured name is stripped before the timestamp is appended.
    pub fn new(log_dir: &Path, log_file_name: &str) -> Self {
        let stem = log_file_name
            .strip_suffix(".log")
            .unwrap_or(log_file_name);
        let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let artifact_stem = log_dir.join(format!("{stem}.{timestamp}"));

        Self {
            log_file: PathBuf::from(format!("{}.log", artifact_stem.display())),
            artifact_stem: artifact_stem.display().to_string(),
        }
    }
}

/// Initializes tracing with a plain-text layer writing to the main log
/// file. The `PM_LOG` environment variable tunes the filter; the default
/// is `info`.
pub fn init_file_logging(log_file: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let filter = EnvFilter::try_from_env("PM_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Arc::new(file)),
        )
        .init();

    Ok(())
}
