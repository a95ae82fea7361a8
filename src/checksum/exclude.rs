//! Exclusion rules for directory fingerprints
//!
//! Rules match the bare entry name at every depth of the tree, so `target`
//! excludes `./target` as well as `./crates/foo/target`.

use crate::error::{WeaveError, WeaveResult};
use globset::{Glob, GlobMatcher};
use tracing::debug;

/// Names that never contribute to a repository fingerprint
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // Version control metadata
    ".git",
    ".svn",
    ".hg",
    // Dependency caches
    "node_modules",
    "bower_components",
    ".pnpm-store",
    ".venv",
    "venv",
    "__pycache__",
    ".tox",
    // Build output
    "target",
    "dist",
    "build",
    "out",
    ".next",
    ".nuxt",
    ".gradle",
    "coverage",
    // Editors and IDEs
    ".idea",
    ".vscode",
    "*.swp",
    "*~",
    // OS metadata
    ".DS_Store",
    "Thumbs.db",
    // Logs and temp files
    "*.log",
    "*.tmp",
    "npm-debug.log*",
    "yarn-error.log*",
];

/// A single exclusion rule
#[derive(Debug, Clone)]
pub enum ExclusionRule {
    /// Entry name equals the pattern
    Exact(String),
    /// Entry name starts with the pattern (written as `prefix*`)
    Prefix(String),
    /// Shell-style wildcard (`*`, `?`, `[...]`)
    Wildcard(GlobMatcher),
}

impl ExclusionRule {
    /// Parse a pattern string into a rule
    pub fn parse(pattern: &str) -> WeaveResult<Self> {
        if pattern.is_empty() {
            return Err(WeaveError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern cannot be empty".to_string(),
            });
        }
        if pattern.contains('/') || pattern.contains('\\') {
            return Err(WeaveError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "patterns match entry names and must not contain path separators"
                    .to_string(),
            });
        }

        if let Some(prefix) = pattern.strip_suffix('*') {
            if !prefix.is_empty() && !has_wildcard(prefix) {
                return Ok(Self::Prefix(prefix.to_string()));
            }
        }

        if has_wildcard(pattern) {
            let glob = Glob::new(pattern).map_err(|e| WeaveError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Self::Wildcard(glob.compile_matcher()));
        }

        Ok(Self::Exact(pattern.to_string()))
    }

    /// Check whether an entry name matches this rule
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Exact(exact) => name == exact,
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Wildcard(matcher) => matcher.is_match(name),
        }
    }
}

fn has_wildcard(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Ordered set of exclusion rules
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    rules: Vec<ExclusionRule>,
}

impl ExclusionSet {
    /// A set that excludes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in noise set
    pub fn defaults() -> Self {
        let rules = DEFAULT_EXCLUDES
            .iter()
            .filter_map(|p| ExclusionRule::parse(p).ok())
            .collect();
        Self { rules }
    }

    /// Built-in defaults extended with user patterns
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> WeaveResult<Self> {
        let mut set = Self::defaults();
        for pattern in patterns {
            set.push(pattern.as_ref())?;
        }
        debug!("Exclusion set has {} rules", set.rules.len());
        Ok(set)
    }

    /// Add a single pattern
    pub fn push(&mut self, pattern: &str) -> WeaveResult<()> {
        self.rules.push(ExclusionRule::parse(pattern)?);
        Ok(())
    }

    /// Check whether an entry with this bare name is excluded
    pub fn is_excluded(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(name))
    }

    /// Number of rules in the set
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
