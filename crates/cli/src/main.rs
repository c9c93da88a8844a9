//! pm - Command-line interface for the Plugin Manager (PM).

mod commands;
mod config;
mod graph;
mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pm")]
#[command(
    author,
    version,
    about = "Plugin Manager (PM) is a tool for running plugins with declared dependencies"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run plugins of the specified type.
    Run {
        #[command(flatten)]
        selection: Selection,

        /// Enforce running plugins in sequence.
        #[arg(long)]
        sequential: bool,

        /// The format to write the results in. Supported output formats
        /// are 'json', 'yaml'.
        #[arg(long)]
        output_format: Option<String>,

        /// Name of the file to write the results to.
        #[arg(long)]
        output_file: Option<PathBuf>,

        #[command(flatten)]
        logging: LogOptions,
    },

    /// List plugins of the specified type and their dependencies.
    List {
        #[command(flatten)]
        selection: Selection,

        #[command(flatten)]
        logging: LogOptions,
    },

    /// Print the Plugin Manager (PM) version.
    Version,
}

/// Where the plugins come from.
#[derive(Args)]
struct Selection {
    /// Type of plugin.
    #[arg(long = "type", default_value = "")]
    type_tag: String,

    /// Path of the plugins library.
    #[arg(long)]
    library: Option<PathBuf>,

    /// Inline JSON plugin list, or a path to a JSON/YAML plugin list file.
    #[arg(long)]
    plugins: Option<String>,
}

#[derive(Args)]
struct LogOptions {
    /// Directory for the log file.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Name of the log file.
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("Plugin Manager (PM) version {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut config = config::Config::load();
    match &cli.command {
        Commands::Run {
            selection, logging, ..
        }
        | Commands::List { selection, logging } => {
            apply_overrides(&mut config, selection, logging);
        }
        Commands::Version => unreachable!("handled above"),
    }

    let paths = logging::LogPaths::new(&config.log_dir(), &config.log_file());
    if let Err(err) = logging::init_file_logging(&paths.log_file) {
        output::warning(&format!(
            "Failed to open log file {}: {err}. Continuing without file logging.",
            paths.log_file.display()
        ));
    }

    let result = match cli.command {
        Commands::Run {
            selection,
            sequential,
            output_format,
            output_file,
            ..
        } => {
            commands::run::execute(
                &config,
                &selection.type_tag,
                selection.plugins.as_deref(),
                sequential,
                output_format.as_deref(),
                output_file.as_deref(),
                &paths.artifact_stem,
            )
            .await
        }

        Commands::List { selection, .. } => commands::list::execute(
            &config,
            &selection.type_tag,
            selection.plugins.as_deref(),
            &paths.artifact_stem,
        ),

        Commands::Version => unreachable!("handled above"),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:?}", err);
            ExitCode::FAILURE
        }
    }
}

/// Command-line flags override the config file.
fn apply_overrides(config: &mut config::Config, selection: &Selection, logging: &LogOptions) {
    if let Some(library) = &selection.library {
        config.plugin_manager.library = library.display().to_string();
    }
    if let Some(log_dir) = &logging.log_dir {
        config.plugin_manager.log_dir = log_dir.display().to_string();
    }
    if let Some(log_file) = &logging.log_file {
        config.plugin_manager.log_file = log_file.clone();
    }
}
