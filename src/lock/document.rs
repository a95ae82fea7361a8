//! Lock document schema
//!
//! The document is written as pretty JSON with camelCase keys. Maps are
//! `BTreeMap`s so the file has a stable key order and diffs cleanly.

use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Lock document format understood by this version
pub const FORMAT_VERSION: &str = "1.0";

/// Outcome recorded for a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseStatus {
    Success,
    Failed,
}

/// Cached evidence for one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRecord {
    /// Combined hash of the working tree, excluding noise directories
    #[serde(default)]
    pub content_checksum: Option<String>,

    /// When this record was last touched
    #[serde(default = "Utc::now")]
    pub last_processed_at: DateTime<Utc>,

    /// Traits applied at the last update
    #[serde(default)]
    pub traits: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_clone_status: Option<PhaseStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_clone_timestamp: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_clone_status: Option<PhaseStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_clone_timestamp: Option<DateTime<Utc>>,

    /// Dependency manifest file name to content hash
    #[serde(default)]
    pub dependency_files: BTreeMap<String, String>,

    /// Hash of the repository's file-based custom hook, per phase
    #[serde(default)]
    pub custom_scripts: BTreeMap<Phase, String>,

    /// Shared inputs each phase last succeeded against
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub phase_inputs: BTreeMap<Phase, PhaseInputs>,
}

/// Configuration and trait file hashes seen by one successful phase
///
/// Kept per record so that another repository refreshing the global
/// checksums cannot hide drift from this one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseInputs {
    #[serde(default)]
    pub config_file_hash: Option<String>,

    /// `{trait}/{file}` to content hash, for the phase's traits only
    #[serde(default)]
    pub trait_script_hashes: BTreeMap<String, String>,
}

impl RepositoryRecord {
    /// The default record created on first update
    ///
    /// No phase has run, nothing is hashed, and every comparison against
    /// this record reports a change.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            content_checksum: None,
            last_processed_at: now,
            traits: Vec::new(),
            pre_clone_status: None,
            pre_clone_timestamp: None,
            post_clone_status: None,
            post_clone_timestamp: None,
            dependency_files: BTreeMap::new(),
            custom_scripts: BTreeMap::new(),
            phase_inputs: BTreeMap::new(),
        }
    }

    /// Recorded status for a phase
    pub fn status(&self, phase: Phase) -> Option<PhaseStatus> {
        match phase {
            Phase::PreClone => self.pre_clone_status,
            Phase::PostClone => self.post_clone_status,
        }
    }

    /// When the phase last finished
    pub fn timestamp(&self, phase: Phase) -> Option<DateTime<Utc>> {
        match phase {
            Phase::PreClone => self.pre_clone_timestamp,
            Phase::PostClone => self.post_clone_timestamp,
        }
    }

    fn set_phase(&mut self, phase: Phase, status: PhaseStatus, at: DateTime<Utc>) {
        match phase {
            Phase::PreClone => {
                self.pre_clone_status = Some(status);
                self.pre_clone_timestamp = Some(at);
            }
            Phase::PostClone => {
                self.post_clone_status = Some(status);
                self.post_clone_timestamp = Some(at);
            }
        }
    }
}

/// Partial update for a repository record
///
/// Each field that is set replaces the stored value wholesale, except the
/// per-phase entries (custom script hash, phase inputs) which replace only
/// the key of their phase.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    phase: Option<(Phase, PhaseStatus, DateTime<Utc>)>,
    content_checksum: Option<Option<String>>,
    traits: Option<Vec<String>>,
    dependency_files: Option<BTreeMap<String, String>>,
    custom_script: Option<(Phase, Option<String>)>,
    phase_inputs: Option<(Phase, PhaseInputs)>,
}

impl RecordUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(mut self, phase: Phase, status: PhaseStatus, at: DateTime<Utc>) -> Self {
        self.phase = Some((phase, status, at));
        self
    }

    pub fn content_checksum(mut self, checksum: Option<String>) -> Self {
        self.content_checksum = Some(checksum);
        self
    }

    pub fn traits(mut self, traits: Vec<String>) -> Self {
        self.traits = Some(traits);
        self
    }

    pub fn dependency_files(mut self, files: BTreeMap<String, String>) -> Self {
        self.dependency_files = Some(files);
        self
    }

    /// Set or, with `None`, remove the custom script hash of one phase
    pub fn custom_script(mut self, phase: Phase, hash: Option<String>) -> Self {
        self.custom_script = Some((phase, hash));
        self
    }

    pub fn phase_inputs(mut self, phase: Phase, inputs: PhaseInputs) -> Self {
        self.phase_inputs = Some((phase, inputs));
        self
    }

    pub(crate) fn apply(self, record: &mut RepositoryRecord) {
        if let Some((phase, status, at)) = self.phase {
            record.set_phase(phase, status, at);
        }
        if let Some(checksum) = self.content_checksum {
            record.content_checksum = checksum;
        }
        if let Some(traits) = self.traits {
            record.traits = traits;
        }
        if let Some(files) = self.dependency_files {
            record.dependency_files = files;
        }
        match self.custom_script {
            Some((phase, Some(hash))) => {
                record.custom_scripts.insert(phase, hash);
            }
            Some((phase, None)) => {
                record.custom_scripts.remove(&phase);
            }
            None => {}
        }
        if let Some((phase, inputs)) = self.phase_inputs {
            record.phase_inputs.insert(phase, inputs);
        }
    }
}

/// Checksums shared by every repository
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalChecksums {
    /// Hash of the repository list configuration
    #[serde(default)]
    pub config_file_hash: Option<String>,

    /// `{trait}/{file}` to content hash
    #[serde(default)]
    pub trait_script_hashes: BTreeMap<String, String>,
}

/// Partial update for the global checksums, merged field by field
#[derive(Debug, Clone, Default)]
pub struct GlobalUpdate {
    config_file_hash: Option<Option<String>>,
    trait_script_hashes: Option<BTreeMap<String, String>>,
}

impl GlobalUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config_file_hash(mut self, hash: Option<String>) -> Self {
        self.config_file_hash = Some(hash);
        self
    }

    pub fn trait_script_hashes(mut self, hashes: BTreeMap<String, String>) -> Self {
        self.trait_script_hashes = Some(hashes);
        self
    }

    pub(crate) fn apply(self, globals: &mut GlobalChecksums) {
        if let Some(hash) = self.config_file_hash {
            globals.config_file_hash = hash;
        }
        if let Some(hashes) = self.trait_script_hashes {
            globals.trait_script_hashes = hashes;
        }
    }
}

/// The whole persisted cache state for one project root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockDocument {
    #[serde(default)]
    pub format_version: String,

    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,

    pub repositories: BTreeMap<String, RepositoryRecord>,

    pub global_checksums: GlobalChecksums,
}

impl LockDocument {
    /// A freshly initialized, empty document
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            generated_at: Some(Utc::now()),
            repositories: BTreeMap::new(),
            global_checksums: GlobalChecksums::default(),
        }
    }
}

impl Default for LockDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Problems found while inspecting a raw lock document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentIssues {
    /// Missing or mistyped structure; the document cannot be used
    pub structural: Vec<String>,
    /// Version or metadata problems; the document is usable best-effort
    pub metadata: Vec<String>,
}

impl DocumentIssues {
    pub fn is_empty(&self) -> bool {
        self.structural.is_empty() && self.metadata.is_empty()
    }

    /// All issues, structural first
    pub fn all(&self) -> Vec<String> {
        self.structural
            .iter()
            .chain(self.metadata.iter())
            .cloned()
            .collect()
    }
}

/// Check the shape of a raw JSON lock document
pub fn inspect_document(value: &Value) -> DocumentIssues {
    let mut issues = DocumentIssues::default();

    let Some(root) = value.as_object() else {
        issues
            .structural
            .push("document is not a JSON object".to_string());
        return issues;
    };

    match root.get("formatVersion") {
        Some(Value::String(v)) if v == FORMAT_VERSION => {}
        Some(Value::String(v)) => issues.metadata.push(format!(
            "unsupported format version {} (expected {})",
            v, FORMAT_VERSION
        )),
        Some(_) => issues
            .metadata
            .push("formatVersion is not a string".to_string()),
        None => issues.metadata.push("missing formatVersion".to_string()),
    }

    match root.get("generatedAt") {
        Some(Value::String(_)) => {}
        Some(_) => issues
            .metadata
            .push("generatedAt is not a timestamp string".to_string()),
        None => issues.metadata.push("missing generatedAt".to_string()),
    }

    match root.get("repositories") {
        Some(Value::Object(_)) => {}
        Some(_) => issues
            .structural
            .push("repositories is not an object".to_string()),
        None => issues.structural.push("missing repositories".to_string()),
    }

    match root.get("globalChecksums") {
        Some(Value::Object(globals)) => {
            match globals.get("traitScriptHashes") {
                Some(Value::Object(_)) | None => {}
                Some(_) => issues
                    .structural
                    .push("globalChecksums.traitScriptHashes is not an object".to_string()),
            }
            match globals.get("configFileHash") {
                Some(Value::String(_)) | Some(Value::Null) | None => {}
                Some(_) => issues
                    .structural
                    .push("globalChecksums.configFileHash is not a string".to_string()),
            }
        }
        Some(_) => issues
            .structural
            .push("globalChecksums is not an object".to_string()),
        None => issues
            .structural
            .push("missing globalChecksums".to_string()),
    }

    issues
}
