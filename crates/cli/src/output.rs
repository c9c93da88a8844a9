//! Terminal output formatting and result-document serialization.

use std::fs;
use std::path::Path;

use console::style;
use miette::{IntoDiagnostic, Result, miette};
use pm_core::{PluginStatus, RunStatus};

/// Prints an informational message.
pub fn info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Prints one plugin state-change line, `"<description>: <status>"`.
/// Failures go to stderr, everything else to stdout.
pub fn plugin_status(description: &str, status: PluginStatus) {
    match status {
        PluginStatus::Starting => println!("{description}: {}", style("Starting").cyan()),
        PluginStatus::Succeeded => println!("{description}: {}", style("Succeeded").green()),
        PluginStatus::Skipped => println!("{description}: {}", style("Skipped").yellow()),
        PluginStatus::Failed => eprintln!("{description}: {}", style("Failed").red().bold()),
    }
}

/// Prints the final run summary line.
pub fn run_summary(type_tag: &str, status: PluginStatus) {
    let line = format!("Running {type_tag} plugins: {status}");
    if status == PluginStatus::Succeeded {
        println!("{}", style(line).green());
    } else {
        eprintln!("{}", style(line).red().bold());
    }
}

/// Writes the result document in the requested format, to a file or to
/// stdout. An unset format writes nothing.
pub fn write_result(
    result: &RunStatus,
    format: Option<&str>,
    file: Option<&Path>,
) -> Result<()> {
    let Some(format) = format else { return Ok(()) };

    let document = match format {
        "json" => serde_json::to_string_pretty(result).into_diagnostic()?,
        "yaml" => serde_yaml::to_string(result).into_diagnostic()?,
        other => {
            return Err(miette!(
                "Unknown output format: {other}. Supported output formats are 'json', 'yaml'."
            ));
        }
    };

    match file {
        Some(path) => fs::write(path, document).into_diagnostic()?,
        None => println!("{document}"),
    }

    Ok(())
}
