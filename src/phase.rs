//! Setup phases tracked by the cache

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named setup phase at which trait and custom hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Runs before the repository is cloned
    #[serde(rename = "preClone")]
    PreClone,
    /// Runs after the repository is cloned or reconciled
    #[serde(rename = "postClone")]
    PostClone,
}

impl Phase {
    /// Hook name as written in configuration and lock files
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreClone => "preClone",
            Self::PostClone => "postClone",
        }
    }

    /// Both phases in execution order
    pub fn all() -> &'static [Self] {
        &[Self::PreClone, Self::PostClone]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
