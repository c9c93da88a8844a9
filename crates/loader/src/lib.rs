//! PM Loader - Descriptor parsing and plugin discovery for the Plugin
//! Manager (PM).
//!
//! Plugins come from one of two places: a library directory holding
//! unit-style descriptor files (one subdirectory per component), or a
//! serialized descriptor list supplied directly on the command line.

mod library;
mod list;
mod unit;

pub use library::load_library;
pub use list::{PluginList, load_list};
pub use unit::parse_unit_file;

use std::collections::HashSet;

use pm_core::{PluginAttributes, PmError, Result};

/// Plugin names must be unique within an invocation.
pub(crate) fn ensure_unique_names(plugins: &[PluginAttributes]) -> Result<()> {
    let mut seen = HashSet::new();
    for plugin in plugins {
        if !seen.insert(plugin.name.as_str()) {
            return Err(PmError::DuplicatePlugin(plugin.name.clone()));
        }
    }
    Ok(())
}
