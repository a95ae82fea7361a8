//! repoweave - cached setup phases for multi-repository workspaces
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use repoweave::cli::{Cli, Commands, LogFormat};
use repoweave::config::ConfigManager;
use repoweave::error::{WeaveError, WeaveResult};
use repoweave::workspace::Workspace;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> WeaveResult<()> {
    let cli = Cli::parse();

    let root = match cli.root.clone() {
        Some(root) => root,
        None => std::env::current_dir()
            .map_err(|e| WeaveError::io("getting current directory", e))?,
    };

    let config_manager = match cli.config.clone() {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(&root),
    };
    let global_config = ConfigManager::global_config_path();
    let config = config_manager.load_merged(global_config.as_deref()).await?;

    let json_logs = match cli.log_format {
        Some(format) => format == LogFormat::Json,
        None => config.json_logs(),
    };
    init_logging(cli.verbose, json_logs);
    debug!("Project root: {}", root.display());

    if let Commands::Config(args) = cli.command {
        return repoweave::cli::commands::config(args, &config_manager, &config, &root).await;
    }

    let workspace = Workspace::new(root, config, cli.lock_file.clone(), cli.cache.options());

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Plan(args) => repoweave::cli::commands::plan(args, &workspace).await,
        Commands::Status => repoweave::cli::commands::status(&workspace).await,
        Commands::Record(args) => repoweave::cli::commands::record(args, &workspace).await,
        Commands::Verify => repoweave::cli::commands::verify(&workspace).await,
        Commands::Clear(args) => repoweave::cli::commands::clear(args, &workspace).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; logs go to stderr so JSON output stays clean
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("repoweave=warn"),
        1 => EnvFilter::new("repoweave=info"),
        _ => EnvFilter::new("repoweave=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
