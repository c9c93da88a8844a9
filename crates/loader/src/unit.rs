//! Descriptor (unit) file parsing.
//!
//! Descriptors are systemd-unit-inspired plain text, authored by humans.
//! Parsing is deliberately lax: it ignores what it does not understand and
//! never fails on malformed content.

use pm_core::PluginAttributes;
use tracing::debug;

/// Parses the text of one plugin descriptor file.
///
/// Each line is trimmed; blank lines and `#` comments are skipped. The
/// first `=` splits key from value (further `=` belong to the value).
/// Recognized keys are `Description`, `ExecStart`, `Requires` and
/// `RequiredBy`; list values are space-separated plugin names. An empty
/// file yields default attributes.
pub fn parse_unit_file(contents: &str) -> PluginAttributes {
    let mut attrs = PluginAttributes::default();

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            debug!(line, "non-standard descriptor line");
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "Description" => attrs.description = value.to_string(),
            "ExecStart" => attrs.exec_start = value.to_string(),
            "Requires" => attrs.requires = split_names(value),
            "RequiredBy" => attrs.required_by = split_names(value),
            _ => debug!(key, "ignoring unknown descriptor key"),
        }
    }

    attrs
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(' ')
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
