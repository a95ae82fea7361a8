//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{CacheFlags, Cli, Commands, LogFormat, OutputFormat, PhaseArg};
