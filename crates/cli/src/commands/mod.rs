//! Command implementations.

pub mod list;
pub mod run;

use pm_core::{PluginAttributes, Result};

use crate::config::Config;

/// Resolves the plugin set and its type tag from either the explicit
/// `--plugins` argument or the configured library.
///
/// A type tag carried by an explicit plugin list wins over the flag.
pub(crate) fn resolve_plugins(
    config: &Config,
    type_tag: &str,
    plugins_arg: Option<&str>,
) -> Result<(String, Vec<PluginAttributes>)> {
    match plugins_arg {
        Some(arg) => {
            let list = pm_loader::load_list(arg)?;
            let tag = if list.type_tag.is_empty() {
                type_tag.to_string()
            } else {
                list.type_tag
            };
            Ok((tag, list.plugins))
        }
        None => {
            let plugins = pm_loader::load_library(&config.library(), type_tag)?;
            Ok((type_tag.to_string(), plugins))
        }
    }
}
