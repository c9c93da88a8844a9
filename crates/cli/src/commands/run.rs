//! Run command implementation: the full load → normalize → execute
//! pipeline.

use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use miette::Result;
use pm_core::{PluginStatus, RunStatus};
use pm_engine::{Executor, PluginCallback, PluginEvent, normalize};
use tracing::info;

use crate::config::Config;
use crate::graph::DotRenderer;
use crate::output;

/// Runs all plugins of a type and reports the overall verdict through the
/// exit code: 0 when everything succeeded, 1 otherwise.
pub async fn execute(
    config: &Config,
    type_tag: &str,
    plugins_arg: Option<&str>,
    sequential: bool,
    output_format: Option<&str>,
    output_file: Option<&Path>,
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
            let mut result = RunStatus::new(type_tag);
            result.status = PluginStatus::Failed;
            result.stdouterr = err.to_string();
            output::write_result(&result, output_format, output_file)?;
            return Ok(ExitCode::FAILURE);
        }
    };
    info!(r#type = %type_tag, count = plugins.len(), "loaded plugins");

    let mut result = RunStatus::new(&type_tag);

    let plugins_log_dir = config.plugins_log_dir();
    if let Err(err) = std::fs::create_dir_all(&plugins_log_dir) {
        let message = format!(
            "Failed to create the plugins logs directory: {}. Error: {err}",
            plugins_log_dir.display()
        );
        output::error(&message);
        result.status = PluginStatus::Failed;
        result.stdouterr = message;
        output::write_result(&result, output_format, output_file)?;
        return Ok(ExitCode::FAILURE);
    }

    // Plugins can reach binaries shipped next to them through
    // ${PM_LIBRARY}; PM_PLUGIN_DIR is its deprecated alias.
    let library = config.library().display().to_string();
    let mut env = HashMap::new();
    env.insert("PM_LIBRARY".to_string(), library.clone());
    env.insert("PM_PLUGIN_DIR".to_string(), library);

    let callback: PluginCallback = Arc::new(|event| match event {
        PluginEvent::Started { description, .. } => {
            output::plugin_status(&description, PluginStatus::Starting);
        }
        PluginEvent::Finished {
            description, status, ..
        } => {
            output::plugin_status(&description, status);
        }
    });

    let renderer = Arc::new(DotRenderer::new(artifact_stem));
    let executor = Executor::new(&type_tag, normalize(plugins))
        .with_sequential(sequential)
        .with_env(env)
        .with_plugins_log_dir(&plugins_log_dir)
        .with_notifier(renderer)
        .with_callback(callback);

    if let Err(err) = executor.run(&mut result).await {
        output::error(&err.to_string());
    }

    output::run_summary(&type_tag, result.status);
    output::write_result(&result, output_format, output_file)?;

    if result.status == PluginStatus::Succeeded {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
