//! Concurrent DAG executor.
//!
//! One scheduler loop plus one short-lived execution task per plugin. The
//! scheduler owns every piece of bookkeeping (wait counts, failed
//! dependencies, the result sequence); tasks report back over a single
//! completion channel, and that `recv` is the scheduler's only suspension
//! point. Each loop turn either launches ready work or consumes one
//! completion, so the run always makes forward progress.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, SecondsFormat};
use pm_core::{PluginAttributes, PluginResult, PluginStatus, Result, RunStatus, expand_env};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::notifier::{GraphNotifier, NoopNotifier};
use crate::validate::validate_dependencies;

/// Callback for plugin lifecycle events.
pub type PluginCallback = Arc<dyn Fn(PluginEvent) + Send + Sync>;

/// Events emitted as plugins progress through the run.
#[derive(Debug, Clone)]
pub enum PluginEvent {
    /// Plugin dispatched (it may still resolve to `Skipped`).
    Started {
        name: String,
        description: String,
    },
    /// Plugin reached a terminal status.
    Finished {
        name: String,
        description: String,
        status: PluginStatus,
    },
}

/// One message from an execution task back to the scheduler.
#[derive(Debug)]
struct Completion {
    index: usize,
    status: PluginStatus,
    stdouterr: String,
    /// Plugin log file path relative to the run's log directory, empty
    /// when no log file was written.
    log_path: String,
}

/// Executes a normalized plugin set, honoring the dependency partial
/// order and skipping plugins whose prerequisites failed.
pub struct Executor {
    type_tag: String,
    plugins: Vec<PluginAttributes>,
    sequential: bool,
    env: HashMap<String, String>,
    plugins_log_dir: Option<PathBuf>,
    notifier: Arc<dyn GraphNotifier>,
    callback: Option<PluginCallback>,
}

impl Executor {
    /// Creates an executor over a normalized plugin set.
    pub fn new(type_tag: impl Into<String>, plugins: Vec<PluginAttributes>) -> Self {
        Self {
            type_tag: type_tag.into(),
            plugins,
            sequential: false,
            env: HashMap::new(),
            plugins_log_dir: None,
            notifier: Arc::new(NoopNotifier),
            callback: None,
        }
    }

    /// Enforces at most one plugin in flight at a time.
    pub fn with_sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    /// Extra environment exported to plugin commands and used for `${VAR}`
    /// expansion. Overrides the host environment on conflict.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Directory for per-plugin log files. Unset disables them.
    pub fn with_plugins_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugins_log_dir = Some(dir.into());
        self
    }

    /// Sets the graph notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn GraphNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets a callback for plugin lifecycle events.
    pub fn with_callback(mut self, callback: PluginCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Runs every plugin to a terminal state, populating `result` in
    /// scheduling order.
    ///
    /// Dependencies are re-validated first; on validation failure nothing
    /// executes, the overall status is `Failed` and the diagnostic lands
    /// in the top-level `stdouterr`. Individual plugin failures do not
    /// abort the run: dependents are skipped and everything else keeps
    /// going. The overall status is `Succeeded` iff every plugin
    /// succeeded.
    pub async fn run(&self, result: &mut RunStatus) -> Result<()> {
        if let Err(err) = validate_dependencies(&self.plugins) {
            result.status = PluginStatus::Failed;
            result.stdouterr = err.to_string();
            return Err(err);
        }

        self.notifier.init(&self.type_tag, &self.plugins);

        let merged_env = self.merged_env();
        let n = self.plugins.len();
        let index: HashMap<&str, usize> = self
            .plugins
            .iter()
            .enumerate()
            .map(|(i, plugin)| (plugin.name.as_str(), i))
            .collect();

        let mut wait_count: Vec<i64> = self
            .plugins
            .iter()
            .map(|plugin| plugin.requires.len() as i64)
            .collect();
        let mut failed_dep = vec![false; n];
        let mut known: HashSet<usize> = (0..n).collect();
        let mut result_slot: Vec<Option<usize>> = vec![None; n];
        let mut in_flight = 0usize;
        let mut overall_ok = true;

        let (tx, mut rx) = mpsc::channel::<Completion>(n.max(1));

        while !known.is_empty() || in_flight > 0 {
            // Launch pass: dispatch everything that is ready, without
            // blocking. A wait count of -1 marks a launched plugin.
            for idx in 0..n {
                if !known.contains(&idx) || wait_count[idx] != 0 {
                    continue;
                }
                if self.sequential && in_flight > 0 {
                    continue;
                }
                wait_count[idx] = -1;

                let attrs = &self.plugins[idx];
                info!(plugin = %attrs.name, "plugin ready for execution");

                result.plugins.push(PluginResult::starting(attrs.clone()));
                result_slot[idx] = Some(result.plugins.len() - 1);

                self.emit(PluginEvent::Started {
                    name: attrs.name.clone(),
                    description: attrs.description.clone(),
                });
                self.notifier
                    .update(&self.type_tag, &attrs.name, PluginStatus::Starting, "");

                tokio::spawn(run_plugin(
                    idx,
                    attrs.clone(),
                    merged_env.clone(),
                    failed_dep[idx],
                    self.plugins_log_dir.clone(),
                    tx.clone(),
                ));
                in_flight += 1;
            }

            // The single suspension point: wait for one completion.
            let Some(done) = rx.recv().await else { break };

            let idx = done.index;
            let attrs = &self.plugins[idx];
            info!(plugin = %attrs.name, status = %done.status, "plugin finished");

            let slot = result_slot[idx].expect("completion for a plugin never dispatched");
            result.plugins[slot].status = done.status;
            result.plugins[slot].stdouterr = done.stdouterr;

            if done.status == PluginStatus::Failed {
                overall_ok = false;
            }

            for rby in &attrs.required_by {
                let Some(&ri) = index.get(rby.as_str()) else {
                    continue;
                };
                if matches!(done.status, PluginStatus::Failed | PluginStatus::Skipped) {
                    failed_dep[ri] = true;
                }
                wait_count[ri] -= 1;
            }

            self.emit(PluginEvent::Finished {
                name: attrs.name.clone(),
                description: attrs.description.clone(),
                status: done.status,
            });
            self.notifier
                .update(&self.type_tag, &attrs.name, done.status, &done.log_path);

            known.remove(&idx);
            in_flight -= 1;
        }

        result.status = if overall_ok {
            PluginStatus::Succeeded
        } else {
            PluginStatus::Failed
        };
        Ok(())
    }

    /// Host environment overlaid with the user-supplied map; the user map
    /// wins on conflict.
    fn merged_env(&self) -> HashMap<String, String> {
        let mut merged: HashMap<String, String> = std::env::vars().collect();
        merged.extend(self.env.clone());
        merged
    }

    fn emit(&self, event: PluginEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

/// Execution task: runs one plugin to a terminal state and reports it on
/// the completion channel. Never panics past the send.
async fn run_plugin(
    index: usize,
    attrs: PluginAttributes,
    env: HashMap<String, String>,
    failed_dependency: bool,
    log_dir: Option<PathBuf>,
    tx: mpsc::Sender<Completion>,
) {
    let mut plugin_log = PluginLog::open(log_dir.as_deref(), &attrs.name);
    plugin_log.line(&format!("Plugin file: {}", attrs.name));

    let (status, stdouterr) = if failed_dependency {
        plugin_log.line("Skipping as its dependency failed.");
        info!(plugin = %attrs.name, "skipping as its dependency failed");
        (PluginStatus::Skipped, String::new())
    } else if attrs.exec_start.trim().is_empty() {
        plugin_log.line("Passing as ExecStart value is empty!");
        info!(plugin = %attrs.name, "passing as ExecStart value is empty");
        (PluginStatus::Succeeded, String::new())
    } else {
        plugin_log.line(&format!("Executing command: {}", attrs.exec_start));
        execute_command(&attrs, &env, &mut plugin_log).await
    };

    let _ = tx
        .send(Completion {
            index,
            status,
            stdouterr,
            log_path: plugin_log.rel_path,
        })
        .await;
}

/// Spawns the plugin command and classifies the outcome by exit status.
async fn execute_command(
    attrs: &PluginAttributes,
    env: &HashMap<String, String>,
    plugin_log: &mut PluginLog,
) -> (PluginStatus, String) {
    let (program, args) = command_line(&attrs.exec_start, env);
    debug!(plugin = %attrs.name, %program, ?args, "executing command");

    let output = tokio::process::Command::new(&program)
        .args(&args)
        .envs(env)
        .output()
        .await;

    match output {
        Ok(out) => {
            let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&out.stderr));
            plugin_log.line(&format!("Stdout & Stderr: {combined}"));

            if out.status.success() {
                (PluginStatus::Succeeded, combined)
            } else {
                plugin_log.line(&format!("Command failed, {}", out.status));
                error!(plugin = %attrs.name, status = %out.status, "plugin command failed");
                (PluginStatus::Failed, combined)
            }
        }
        Err(err) => {
            plugin_log.line(&format!("Failed to execute command, err={err}"));
            error!(plugin = %attrs.name, error = %err, "failed to execute plugin command");
            (PluginStatus::Failed, err.to_string())
        }
    }
}

/// Splits `exec_start` into program and arguments, expanding `${VAR}`
/// references against the given environment map.
fn command_line(exec_start: &str, env: &HashMap<String, String>) -> (String, Vec<String>) {
    let mut tokens = exec_start.split_whitespace();
    let program = expand_env(tokens.next().unwrap_or_default(), env);
    let rest: Vec<&str> = tokens.collect();
    let args = expand_env(&rest.join(" "), env)
        .split_whitespace()
        .map(str::to_string)
        .collect();
    (program, args)
}

/// Best-effort per-plugin log file; an open failure disables it for the
/// rest of the task.
struct PluginLog {
    file: Option<std::fs::File>,
    /// Path relative to the run's log directory, for the graph node link.
    rel_path: String,
}

impl PluginLog {
    fn open(dir: Option<&Path>, plugin: &str) -> Self {
        let Some(dir) = dir else {
            return Self {
                file: None,
                rel_path: String::new(),
            };
        };

        let file_name = format!(
            "{}.{}.log",
            plugin.replace('/', ":"),
            Local::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
        );
        let path = dir.join(&file_name);
        let rel_path = match dir.file_name() {
            Some(parent) => format!("{}/{file_name}", parent.to_string_lossy()),
            None => file_name.clone(),
        };

        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Self {
                file: Some(file),
                rel_path,
            },
            Err(err) => {
                warn!(file = %path.display(), error = %err, "failed to open plugin log file");
                Self {
                    file: None,
                    rel_path: String::new(),
                }
            }
        }
    }

    fn line(&mut self, message: &str) {
        if let Some(file) = &mut self.file {
            let ts = Local::now().format("%Y/%m/%d %H:%M:%S");
            let _ = writeln!(file, "{ts} {message}");
        }
    }
}
