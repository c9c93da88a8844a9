//! List command implementation: parse and normalize, render the graph,
//! execute nothing.

use std::process::ExitCode;

use console::style;
use miette::Result;
use pm_engine::{GraphNotifier, normalize};

use crate::config::Config;
use crate::graph::DotRenderer;
use crate::output;

/// Lists plugins of a type and their dependencies, and renders the
/// dependency graph image.
pub fn execute(
    config: &Config,
    type_tag: &str,
    plugins_arg: Option<&str>,
    artifact_stem: &str,
) -> Result<ExitCode> {
    if plugins_arg.is_none() && type_tag.is_empty() {
        output::error("A plugin type must be specified with --type.");
        return Ok(ExitCode::from(2));
    }

    let (type_tag, plugins) = match super::resolve_plugins(config, type_tag, plugins_arg) {
        Ok(resolved) => resolved,
        Err(err) => {
            output::error(&err.to_string());
            return Ok(ExitCode::FAILURE);
        }
    };

    let plugins = normalize(plugins);

    println!("{}", style(format!("{type_tag} plugins:")).bold());
    for plugin in &plugins {
        print!("  {}", style(&plugin.name).cyan());
        if !plugin.description.is_empty() {
            print!(" - {}", style(&plugin.description).dim());
        }
        println!();
        if !plugin.requires.is_empty() {
            println!("    Requires: {}", style(plugin.requires.join(", ")).dim());
        }
    }

    let renderer = DotRenderer::new(artifact_stem);
    renderer.init(&type_tag, &plugins);
    output::info(&format!(
        "The list of plugins are mapped in {}",
        renderer.image_path().display()
    ));

    Ok(ExitCode::SUCCESS)
}
