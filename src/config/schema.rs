//! Configuration schema for repoweave
//!
//! Project settings live in `repoweave.toml` at the project root, layered
//! over an optional user-wide `~/.config/repoweave/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Where project inputs and the lock file live
    pub paths: PathsConfig,

    /// Change-detection settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Project layout, relative to the project root unless absolute
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Repository list with trait assignments and hooks
    pub repos_file: PathBuf,

    /// Directory repositories are cloned into
    pub repos_dir: PathBuf,

    /// Directory holding one subdirectory per trait
    pub traits_dir: PathBuf,

    /// Directory holding per-repository custom hook scripts
    pub custom_dir: PathBuf,

    /// Lock file recording cached state
    pub lock_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            repos_file: PathBuf::from("repos.toml"),
            repos_dir: PathBuf::from("repos"),
            traits_dir: PathBuf::from("traits"),
            custom_dir: PathBuf::from("custom"),
            lock_file: PathBuf::from("repoweave.lock"),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable change detection (default: true)
    pub enabled: bool,

    /// Extension of trait hook scripts (`{trait}/{hook}.{ext}`)
    pub script_extension: String,

    /// Name of the per-trait settings file
    pub trait_settings_file: String,

    /// Extra entry names or wildcards left out of content checksums
    pub exclude: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script_extension: "sh".to_string(),
            trait_settings_file: "config.toml".to_string(),
            exclude: vec![],
        }
    }
}

/// Absolute locations of everything the engine reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub repos_file: PathBuf,
    pub repos_dir: PathBuf,
    pub traits_dir: PathBuf,
    pub custom_dir: PathBuf,
    pub lock_file: PathBuf,
}

impl Config {
    /// Resolve configured paths against the project root
    pub fn project_paths(&self, root: &Path) -> ProjectPaths {
        ProjectPaths {
            root: root.to_path_buf(),
            repos_file: root.join(&self.paths.repos_file),
            repos_dir: root.join(&self.paths.repos_dir),
            traits_dir: root.join(&self.paths.traits_dir),
            custom_dir: root.join(&self.paths.custom_dir),
            lock_file: root.join(&self.paths.lock_file),
        }
    }

    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.general.log_format.eq_ignore_ascii_case("json")
    }
}
