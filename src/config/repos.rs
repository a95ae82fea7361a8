//! Repository list parsing
//!
//! The repository list (`repos.toml`) names every managed repository,
//! the traits applied to it and its custom hooks:
//!
//! ```toml
//! [[repositories]]
//! name = "alpha"
//! url = "git@example.com:team/alpha.git"
//! traits = ["node"]
//!
//! [repositories.hooks]
//! preClone = "prepare.sh"
//! postClone = "npm ci"
//! ```

use crate::error::{WeaveError, WeaveResult};
use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Hook values ending in one of these are script files, not commands
pub const SCRIPT_SUFFIXES: &[&str] = &[".sh", ".bash", ".zsh", ".ps1", ".py"];

/// A custom hook: either a shell command or a script file
///
/// The distinction is made once, when the repository list is parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HookValue {
    /// Run as-is by the shell; not tracked by checksum
    InlineCommand(String),
    /// Script under `{custom_dir}/{repo}/`; tracked by checksum
    ScriptFile(PathBuf),
}

impl HookValue {
    /// Classify a raw hook value by its suffix
    pub fn classify(value: &str) -> Self {
        let trimmed = value.trim();
        let is_script = !trimmed.contains(char::is_whitespace)
            && SCRIPT_SUFFIXES.iter().any(|suffix| trimmed.ends_with(suffix));

        if is_script {
            Self::ScriptFile(PathBuf::from(trimmed))
        } else {
            Self::InlineCommand(value.to_string())
        }
    }

    /// Script path relative to the repository's custom directory
    pub fn script_file(&self) -> Option<&Path> {
        match self {
            Self::ScriptFile(path) => Some(path),
            Self::InlineCommand(_) => None,
        }
    }
}

impl From<String> for HookValue {
    fn from(value: String) -> Self {
        Self::classify(&value)
    }
}

impl From<HookValue> for String {
    fn from(value: HookValue) -> Self {
        match value {
            HookValue::InlineCommand(command) => command,
            HookValue::ScriptFile(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// Custom hooks declared for a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookSet {
    #[serde(rename = "preClone", default, skip_serializing_if = "Option::is_none")]
    pub pre_clone: Option<HookValue>,

    #[serde(rename = "postClone", default, skip_serializing_if = "Option::is_none")]
    pub post_clone: Option<HookValue>,
}

impl HookSet {
    pub fn get(&self, phase: Phase) -> Option<&HookValue> {
        match phase {
            Phase::PreClone => self.pre_clone.as_ref(),
            Phase::PostClone => self.post_clone.as_ref(),
        }
    }

    pub fn set(&mut self, phase: Phase, value: HookValue) {
        match phase {
            Phase::PreClone => self.pre_clone = Some(value),
            Phase::PostClone => self.post_clone = Some(value),
        }
    }
}

/// One managed repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDef {
    /// Unique name; also the lock file key
    pub name: String,

    /// Clone URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Working directory, relative to the repositories directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Traits applied to this repository, in order
    #[serde(default)]
    pub traits: Vec<String>,

    /// Repository-specific hooks
    #[serde(default)]
    pub hooks: HookSet,
}

impl RepositoryDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            path: None,
            traits: vec![],
            hooks: HookSet::default(),
        }
    }

    pub fn with_traits<S: Into<String>>(mut self, traits: impl IntoIterator<Item = S>) -> Self {
        self.traits = traits.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hook(mut self, phase: Phase, value: &str) -> Self {
        self.hooks.set(phase, HookValue::classify(value));
        self
    }

    /// Where the repository is checked out
    pub fn working_dir(&self, repos_dir: &Path) -> PathBuf {
        match &self.path {
            Some(path) => repos_dir.join(path),
            None => repos_dir.join(&self.name),
        }
    }
}

/// Parsed repository list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryList {
    #[serde(default)]
    pub repositories: Vec<RepositoryDef>,
}

impl RepositoryList {
    /// Read and validate a repository list file
    pub async fn from_file(path: &Path) -> WeaveResult<Self> {
        if !path.exists() {
            return Err(WeaveError::ConfigNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            WeaveError::io(format!("reading repository list {}", path.display()), e)
        })?;
        Self::parse(&content, path)
    }

    /// Parse and validate repository list content
    pub fn parse(content: &str, origin: &Path) -> WeaveResult<Self> {
        let list: Self = toml::from_str(content).map_err(|e| WeaveError::ConfigInvalid {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;
        list.validate()?;
        Ok(list)
    }

    /// Reject invalid or duplicate names
    pub fn validate(&self) -> WeaveResult<()> {
        let mut seen = HashSet::new();
        for repo in &self.repositories {
            validate_repository_name(&repo.name)?;
            if !seen.insert(repo.name.as_str()) {
                return Err(WeaveError::DuplicateRepository(repo.name.clone()));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryDef> {
        self.repositories.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.name.as_str()).collect()
    }

    /// Pick repositories by name; an empty selection means all of them
    pub fn select(&self, names: &[String]) -> WeaveResult<Vec<&RepositoryDef>> {
        if names.is_empty() {
            return Ok(self.repositories.iter().collect());
        }

        names
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| WeaveError::RepositoryNotFound(name.clone()))
            })
            .collect()
    }
}

/// Validate that a repository name is usable as a directory and lock key
fn validate_repository_name(name: &str) -> WeaveResult<()> {
    let invalid = |reason: &str| WeaveError::InvalidRepositoryName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(invalid("must not contain path separators or '..'"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(invalid(
            "must contain only alphanumeric characters, '.', '-' or '_'",
        ));
    }
    Ok(())
}
