//! Plugin Manager configuration file.
//!
//! A small YAML document located via the `PM_CONF_FILE` environment
//! variable, falling back to a well-known default path. A missing or
//! unparsable config is not fatal: PM warns and proceeds with defaults.
//! Command-line flags override whatever the file supplied.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Environment variable naming the config file path.
pub const ENV_CONF_FILE: &str = "PM_CONF_FILE";

/// Default config file path used when `PM_CONF_FILE` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pm.config.yaml";

const DEFAULT_LOG_DIR: &str = "/var/log/pm";
const DEFAULT_LOG_FILE: &str = "pm.log";

/// Plugin Manager configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "plugin manager")]
    pub plugin_manager: PluginManagerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginManagerConfig {
    /// Root directory whose subdirectories hold plugin descriptor files.
    pub library: String,

    #[serde(rename = "log dir")]
    pub log_dir: String,

    #[serde(rename = "log file")]
    pub log_file: String,

    /// Deprecated alias of `library`, honored when `library` is unset.
    #[serde(rename = "plugin dir")]
    pub plugin_dir: String,
}

impl Config {
    /// Loads the config named by `PM_CONF_FILE`, or the default path.
    pub fn load() -> Self {
        let path = std::env::var(ENV_CONF_FILE)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Loads a config file, degrading to defaults on any failure.
    pub fn load_from(path: &Path) -> Self {
        let mut config = match fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!(
                        "WARNING: Failed to parse {} config file: {err}. \
                         Using default values and proceeding with the operation.",
                        path.display()
                    );
                    Config::default()
                }
            },
            Err(_) => {
                eprintln!(
                    "WARNING: Failed to read \"{}\" file. \
                     Using default values and proceeding with the operation.",
                    path.display()
                );
                Config::default()
            }
        };

        // `plugin dir` predates `library`; keep honoring it.
        if config.plugin_manager.library.is_empty()
            && !config.plugin_manager.plugin_dir.is_empty()
        {
            config.plugin_manager.library = config.plugin_manager.plugin_dir.clone();
        }

        config
    }

    /// Location of the plugins library.
    pub fn library(&self) -> PathBuf {
        PathBuf::from(&self.plugin_manager.library)
    }

    /// Directory for the main log file and graph artifacts.
    pub fn log_dir(&self) -> PathBuf {
        if self.plugin_manager.log_dir.is_empty() {
            PathBuf::from(DEFAULT_LOG_DIR)
        } else {
            PathBuf::from(&self.plugin_manager.log_dir)
        }
    }

    /// Base name of the main log file.
    pub fn log_file(&self) -> String {
        if self.plugin_manager.log_file.is_empty() {
            DEFAULT_LOG_FILE.to_string()
        } else {
            self.plugin_manager.log_file.clone()
        }
    }

    /// Directory for per-plugin execution logs.
    pub fn plugins_log_dir(&self) -> PathBuf {
        self.log_dir().join("plugins")
    }
}
