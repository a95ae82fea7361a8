//! Error types for repoweave
//!
//! All modules use `WeaveResult<T>` as their return type. Read-side
//! failures inside the cache engine never surface here: they degrade to
//! "no data" and are logged. Only configuration problems and a failed
//! lock save are fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for repoweave operations
pub type WeaveResult<T> = Result<T, WeaveError>;

/// All errors that can occur in repoweave
#[derive(Error, Debug)]
pub enum WeaveError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // Repository list errors
    #[error("Repository not found in repository list: {0}")]
    RepositoryNotFound(String),

    #[error("Repository declared more than once: {0}")]
    DuplicateRepository(String),

    #[error("Invalid repository name '{name}': {reason}")]
    InvalidRepositoryName { name: String, reason: String },

    // Lock state errors
    #[error("Failed to save lock file {path}: {source}")]
    LockSave {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock file is invalid: {0}")]
    LockInvalid(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl WeaveError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a lock save error
    pub fn lock_save(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LockSave {
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the run's results were not persisted
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::LockSave { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound(_) => Some("Run: repoweave config init"),
            Self::RepositoryNotFound(_) => Some("Check the names listed in repos.toml"),
            Self::LockSave { .. } => {
                Some("Check write permissions on the project root; cached results were not saved")
            }
            Self::LockInvalid(_) => Some("Run: repoweave clear --yes to start from a fresh lock file"),
            _ => None,
        }
    }
}
