//! Explicit-mode plugin ingestion from a serialized descriptor list.
//!
//! The argument is either inline JSON or a path to a JSON/YAML document in
//! the same shape as the result output; only the `Type` tag and the
//! attribute fields of each `Plugins` entry are consumed.

use std::fs;
use std::path::Path;

use pm_core::{PluginAttributes, PmError, Result};
use serde::Deserialize;
use tracing::debug;

use crate::ensure_unique_names;

/// A decoded plugin list and the optional type tag it carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginList {
    pub type_tag: String,
    pub plugins: Vec<PluginAttributes>,
}

/// The consumed subset of the descriptor-list document. Extra fields such
/// as `Status` and `StdOutErr` are ignored.
#[derive(Debug, Default, Deserialize)]
struct PluginListDoc {
    #[serde(rename = "Type", default)]
    type_tag: String,

    #[serde(rename = "Plugins", default)]
    plugins: Vec<PluginAttributes>,
}

/// Loads a plugin list from `arg`.
///
/// If `arg` names an existing regular file its contents are decoded, with
/// a `.yaml`/`.yml` extension selecting the YAML decoder and anything else
/// JSON. An existing directory is an error. A non-path argument is treated
/// as inline JSON. Decode failures are fatal and carry the decoder
/// diagnostic.
pub fn load_list(arg: &str) -> Result<PluginList> {
    let path = Path::new(arg);

    let doc: PluginListDoc = if path.is_dir() {
        return Err(PmError::PluginListIsDir(path.to_path_buf()));
    } else if path.is_file() {
        debug!(file = %path.display(), "decoding plugin list file");
        let contents = fs::read_to_string(path).map_err(|source| PmError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
                .map_err(|err| PmError::Decode(err.to_string()))?,
            _ => serde_json::from_str(&contents)
                .map_err(|err| PmError::Decode(err.to_string()))?,
        }
    } else {
        debug!("decoding inline plugin list");
        serde_json::from_str(arg).map_err(|err| PmError::Decode(err.to_string()))?
    };

    ensure_unique_names(&doc.plugins)?;
    Ok(PluginList {
        type_tag: doc.type_tag,
        plugins: doc.plugins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const INLINE: &str = r#"{
        "Type": "prereboot",
        "Plugins": [
            { "Name": "A/a.prereboot",
              "Description": "a",
              "ExecStart": "/bin/true",
              "Requires": ["D/d.prereboot"] },
            { "Name": "D/d.prereboot",
              "Description": "d",
              "ExecStart": "/bin/true" }
        ]
    }"#;

    #[test]
    fn test_inline_json() {
        let list = load_list(INLINE).unwrap();
        assert_eq!(list.type_tag, "prereboot");
        assert_eq!(list.plugins.len(), 2);
        assert_eq!(list.plugins[0].name, "A/a.prereboot");
        assert_eq!(list.plugins[0].requires, vec!["D/d.prereboot"]);
    }

    #[test]
    fn test_json_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plugins.json");
        fs::write(&file, INLINE).unwrap();

        let list = load_list(file.to_str().unwrap()).unwrap();
        assert_eq!(list.plugins.len(), 2);
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plugins.yaml");
        fs::write(
            &file,
            "Type: preupgrade\n\
             Plugins:\n\
             - Name: A/a.preupgrade\n\
             \x20 ExecStart: /bin/true\n",
        )
        .unwrap();

        let list = load_list(file.to_str().unwrap()).unwrap();
        assert_eq!(list.type_tag, "preupgrade");
        assert_eq!(list.plugins[0].name, "A/a.preupgrade");
    }

    #[test]
    fn test_status_fields_ignored() {
        let list = load_list(
            r#"{ "Plugins": [
                { "Name": "A/a.t", "Status": "Failed", "StdOutErr": "boom" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(list.type_tag, "");
        assert_eq!(list.plugins[0].name, "A/a.t");
    }

    #[test]
    fn test_directory_is_error() {
        let dir = tempdir().unwrap();
        let result = load_list(dir.path().to_str().unwrap());
        assert!(matches!(result, Err(PmError::PluginListIsDir(_))));
    }

    #[test]
    fn test_bad_inline_json_is_decode_error() {
        let result = load_list("{ not json");
        assert!(matches!(result, Err(PmError::Decode(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = load_list(
            r#"{ "Plugins": [ { "Name": "A/a.t" }, { "Name": "A/a.t" } ] }"#,
        );
        assert!(matches!(result, Err(PmError::DuplicatePlugin(_))));
    }
}
