//! CLI argument definitions using clap derive

use crate::cache::CacheOptions;
use crate::phase::Phase;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// repoweave - cached setup phases for multi-repository workspaces
///
/// Decides which pre-clone and post-clone hooks can be skipped because
/// nothing they depend on changed, and records what ran in a lock file.
#[derive(Parser, Debug)]
#[command(name = "repoweave")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Settings file (defaults to <root>/repoweave.toml)
    #[arg(short, long, global = true, env = "REPOWEAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root (defaults to current directory)
    #[arg(long, global = true, env = "REPOWEAVE_ROOT")]
    pub root: Option<PathBuf>,

    /// Lock file path, relative to the project root
    #[arg(long, global = true)]
    pub lock_file: Option<PathBuf>,

    /// Log format: text or json
    #[arg(long, global = true)]
    pub log_format: Option<LogFormat>,

    #[command(flatten)]
    pub cache: CacheFlags,
}

/// Flags overriding cached decisions
#[derive(Args, Debug, Clone, Default)]
pub struct CacheFlags {
    /// Ignore cached state and do not record results
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Run every phase
    #[arg(long, global = true)]
    pub force: bool,

    /// Run the pre-clone phase of every repository
    #[arg(long, global = true)]
    pub force_pre_clone: bool,

    /// Run the post-clone phase of every repository
    #[arg(long, global = true)]
    pub force_post_clone: bool,

    /// Delete the lock file before loading it
    #[arg(long, global = true)]
    pub clear_lock: bool,

    /// Report decisions without writing the lock file
    #[arg(long, global = true)]
    pub dry_run: bool,
}

impl CacheFlags {
    pub fn options(&self) -> CacheOptions {
        CacheOptions {
            no_cache: self.no_cache,
            force_all: self.force,
            force_pre_clone: self.force_pre_clone,
            force_post_clone: self.force_post_clone,
            clear_lock: self.clear_lock,
            dry_run: self.dry_run,
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show which phases would run and why
    Plan(PlanArgs),

    /// Show cached state and lock file statistics
    Status,

    /// Record the outcome of a phase
    Record(RecordArgs),

    /// Check lock file integrity
    Verify,

    /// Remove cached state
    Clear(ClearArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Repositories to plan (defaults to all)
    pub repositories: Vec<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the record command
#[derive(Parser, Debug)]
pub struct RecordArgs {
    /// Repository name
    pub repository: String,

    /// Phase that finished
    #[arg(short, long)]
    pub phase: PhaseArg,

    /// Record the phase as failed
    #[arg(long)]
    pub failed: bool,
}

/// Arguments for the clear command
#[derive(Parser, Debug)]
pub struct ClearArgs {
    /// Repository whose record to remove (defaults to the whole lock file)
    #[arg(conflicts_with = "orphaned")]
    pub repository: Option<String>,

    /// Remove records of repositories no longer configured
    #[arg(long)]
    pub orphaned: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for the plan command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Tab-separated, one phase per line
    Plain,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Phase names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseArg {
    PreClone,
    PostClone,
}

impl From<PhaseArg> for Phase {
    fn from(arg: PhaseArg) -> Self {
        match arg {
            PhaseArg::PreClone => Phase::PreClone,
            PhaseArg::PostClone => Phase::PostClone,
        }
    }
}
