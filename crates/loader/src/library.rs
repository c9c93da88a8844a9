//! Library-mode plugin discovery.
//!
//! The library root holds one subdirectory per component; each component
//! holds descriptor files whose suffix is the plugin type (for example
//! `A/a.prereboot`). A plugin's name is `"<component>/<file>"`.

use std::fs;
use std::path::{Path, PathBuf};

use pm_core::{PluginAttributes, PmError, Result};
use tracing::{debug, info, warn};

use crate::ensure_unique_names;
use crate::unit::parse_unit_file;

/// Enumerates and parses all descriptors of the given type under the
/// library root.
///
/// A missing root is fatal. Everything else is best-effort: entries that
/// are not directories are skipped, and unreadable component directories
/// or descriptor files are logged and skipped. Components and files are
/// visited in sorted order so the result is deterministic.
pub fn load_library(library: &Path, plugin_type: &str) -> Result<Vec<PluginAttributes>> {
    if !library.is_dir() {
        return Err(PmError::MissingLibrary(library.to_path_buf()));
    }

    let suffix = format!(".{plugin_type}");
    let mut plugins = Vec::new();

    for component in sorted_entries(library)? {
        let component_name = component.file_name().unwrap_or_default().to_string_lossy();
        if !component.is_dir() {
            debug!(entry = %component.display(), "skipping non-directory library entry");
            continue;
        }

        let files = match sorted_entries(&component) {
            Ok(files) => files,
            Err(err) => {
                warn!(component = %component.display(), error = %err, "unable to read component directory");
                continue;
            }
        };

        for file in files {
            let file_name = file.file_name().unwrap_or_default().to_string_lossy();
            if !file_name.ends_with(&suffix) {
                continue;
            }
            let name = format!("{component_name}/{file_name}");

            match fs::read_to_string(&file) {
                Ok(contents) => {
                    let mut attrs = parse_unit_file(&contents);
                    attrs.name = name;
                    info!(plugin = %attrs.name, "loaded plugin descriptor");
                    plugins.push(attrs);
                }
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "failed to read plugin descriptor");
                }
            }
        }
    }

    ensure_unique_names(&plugins)?;
    Ok(plugins)
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_descriptor(library: &Path, component: &str, file: &str, contents: &str) {
        let dir = library.join(component);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_missing_library_is_fatal() {
        let result = load_library(Path::new("/definitely/not/there"), "prereboot");
        assert!(matches!(result, Err(PmError::MissingLibrary(_))));
    }

    #[test]
    fn test_loads_matching_suffix_only() {
        let dir = tempdir().unwrap();
        write_descriptor(dir.path(), "A", "a.prereboot", "Description=a\n");
        write_descriptor(dir.path(), "A", "a.postreboot", "Description=other type\n");
        write_descriptor(dir.path(), "B", "notes.txt", "Description=not a plugin\n");

        let plugins = load_library(dir.path(), "prereboot").unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "A/a.prereboot");
        assert_eq!(plugins[0].description, "a");
    }

    #[test]
    fn test_names_are_component_slash_file() {
        let dir = tempdir().unwrap();
        write_descriptor(dir.path(), "A", "a.prereboot", "");
        write_descriptor(dir.path(), "B", "b.prereboot", "");
        write_descriptor(dir.path(), "C", "c.prereboot", "");
        write_descriptor(dir.path(), "D", "d.prereboot", "");

        let plugins = load_library(dir.path(), "prereboot").unwrap();
        let names: Vec<_> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["A/a.prereboot", "B/b.prereboot", "C/c.prereboot", "D/d.prereboot"]
        );
    }

    #[test]
    fn test_top_level_files_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("stray.prereboot"), "Description=stray\n").unwrap();
        write_descriptor(dir.path(), "A", "a.prereboot", "");

        let plugins = load_library(dir.path(), "prereboot").unwrap();
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "A/a.prereboot");
    }

    #[test]
    fn test_empty_library_yields_no_plugins() {
        let dir = tempdir().unwrap();
        let plugins = load_library(dir.path(), "prereboot").unwrap();
        assert!(plugins.is_empty());
    }
}
