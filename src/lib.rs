//! repoweave - cached setup phases for multi-repository workspaces
//!
//! Fingerprints repositories, trait scripts and dependency manifests, and
//! records in a lock file which setup phases succeeded against which
//! fingerprints, so unchanged work can be skipped on the next run.

pub mod cache;
pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod phase;
pub mod ui;
pub mod workspace;

pub use error::{WeaveError, WeaveResult};
