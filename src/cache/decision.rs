//! Typed cache decisions

use crate::phase::Phase;
use serde::Serialize;
use std::fmt;

/// A dimension of cached evidence checked before skipping a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Configuration,
    TraitScripts,
    CustomScript,
    Content,
    Dependencies,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::TraitScripts => "trait scripts",
            Self::CustomScript => "custom script",
            Self::Content => "content",
            Self::Dependencies => "dependencies",
        };
        write!(f, "{}", name)
    }
}

/// Why a phase has to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "phase", rename_all = "camelCase")]
pub enum RunReason {
    CacheDisabled,
    ForceAll,
    ForcePhase(Phase),
    NoRecord,
    PreviousFailed,
    NeverSucceeded,
    ConfigChanged,
    TraitScriptsChanged,
    CustomScriptChanged,
    ContentChanged,
    DependenciesChanged,
}

impl RunReason {
    /// Whether the run comes from an option rather than evidence
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::CacheDisabled | Self::ForceAll | Self::ForcePhase(_))
    }
}

impl fmt::Display for RunReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheDisabled => write!(f, "cache disabled"),
            Self::ForceAll => write!(f, "forced"),
            Self::ForcePhase(phase) => write!(f, "{} forced", phase),
            Self::NoRecord => write!(f, "no previous record"),
            Self::PreviousFailed => write!(f, "previous run failed"),
            Self::NeverSucceeded => write!(f, "never succeeded"),
            Self::ConfigChanged => write!(f, "configuration changed"),
            Self::TraitScriptsChanged => write!(f, "trait scripts changed"),
            Self::CustomScriptChanged => write!(f, "custom script changed"),
            Self::ContentChanged => write!(f, "repository content changed"),
            Self::DependenciesChanged => write!(f, "dependency files changed"),
        }
    }
}

/// Outcome of evaluating one repository phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Decision {
    /// Every dimension matched the recorded evidence
    Skip { verified: Vec<Dimension> },
    /// The phase must run
    Run(RunReason),
}

impl Decision {
    pub fn can_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }

    pub fn reason(&self) -> Option<RunReason> {
        match self {
            Self::Run(reason) => Some(*reason),
            Self::Skip { .. } => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip { verified } => {
                let names: Vec<String> = verified.iter().map(ToString::to_string).collect();
                write!(f, "skip (unchanged: {})", names.join(", "))
            }
            Self::Run(reason) => write!(f, "run ({})", reason),
        }
    }
}
