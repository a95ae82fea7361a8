//! Durable lock state
//!
//! Load once, mutate in memory, save once. Reads never fail: a missing,
//! unreadable or malformed lock file is replaced by an empty document and
//! the run continues with a cold cache. Saves always fail loudly.

use crate::checksum::file_checksum;
use crate::error::{WeaveError, WeaveResult};
use crate::lock::document::{
    inspect_document, GlobalChecksums, GlobalUpdate, LockDocument, PhaseInputs, RecordUpdate,
    RepositoryRecord,
};
use crate::phase::Phase;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How the in-memory document was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Parsed from the lock file
    Loaded,
    /// The lock file was unusable and an empty document was substituted
    Recovered { reason: String },
    /// No lock file existed
    Initialized,
}

/// Result of an integrity check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Summary of the lock state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockStats {
    pub repository_count: usize,
    pub tracked_script_count: usize,
    pub last_generated: Option<DateTime<Utc>>,
    pub format_version: String,
    pub file_size_bytes: u64,
}

/// Where trait hook scripts and settings files live
#[derive(Debug, Clone)]
pub struct TraitLayout {
    root: PathBuf,
    script_extension: String,
    settings_file: String,
}

impl TraitLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        script_extension: impl Into<String>,
        settings_file: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            script_extension: script_extension.into(),
            settings_file: settings_file.into(),
        }
    }

    /// Root directory holding one subdirectory per trait
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn script_file(&self, phase: Phase) -> String {
        format!("{}.{}", phase.as_str(), self.script_extension)
    }

    /// `{root}/{trait}/{hook}.{ext}`
    pub fn script_path(&self, trait_name: &str, phase: Phase) -> PathBuf {
        self.root.join(trait_name).join(self.script_file(phase))
    }

    /// `{root}/{trait}/{settings file}`
    pub fn settings_path(&self, trait_name: &str) -> PathBuf {
        self.root.join(trait_name).join(&self.settings_file)
    }

    /// Checksum keys and paths relevant to one trait and phase
    pub fn tracked_files(&self, trait_name: &str, phase: Phase) -> [(String, PathBuf); 2] {
        [
            (
                format!("{}/{}", trait_name, self.script_file(phase)),
                self.script_path(trait_name, phase),
            ),
            (
                format!("{}/{}", trait_name, self.settings_file),
                self.settings_path(trait_name),
            ),
        ]
    }
}

/// Owner of the persisted lock document
#[derive(Debug)]
pub struct LockStore {
    path: PathBuf,
    config_file: PathBuf,
    layout: TraitLayout,
    document: LockDocument,
}

impl LockStore {
    /// Create a store; the document stays empty until `load` is called
    pub fn new(path: impl Into<PathBuf>, config_file: impl Into<PathBuf>, layout: TraitLayout) -> Self {
        Self {
            path: path.into(),
            config_file: config_file.into(),
            layout,
            document: LockDocument::new(),
        }
    }

    /// Create a store and load its document
    pub fn open(
        path: impl Into<PathBuf>,
        config_file: impl Into<PathBuf>,
        layout: TraitLayout,
    ) -> (Self, LoadOutcome) {
        let mut store = Self::new(path, config_file, layout);
        let outcome = store.load();
        (store, outcome)
    }

    /// Load the lock file, substituting an empty document when unusable
    pub fn load(&mut self) -> LoadOutcome {
        let (document, outcome) = read_document(&self.path);
        self.document = document;

        match &outcome {
            LoadOutcome::Loaded => debug!(
                "Loaded lock file {} ({} repositories)",
                self.path.display(),
                self.document.repositories.len()
            ),
            LoadOutcome::Initialized => {
                debug!("No lock file at {}, starting fresh", self.path.display())
            }
            LoadOutcome::Recovered { reason } => warn!(
                "Lock file {} is unusable ({}), every phase will run again",
                self.path.display(),
                reason
            ),
        }

        outcome
    }

    /// Check version, metadata and shape of the in-memory document
    pub fn validate_integrity(&self) -> IntegrityReport {
        let errors = match serde_json::to_value(&self.document) {
            Ok(value) => inspect_document(&value).all(),
            Err(e) => vec![format!("document cannot be serialized: {}", e)],
        };

        IntegrityReport {
            valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        }
    }

    /// Write the document atomically, stamping `generatedAt`
    pub fn save(&mut self) -> WeaveResult<()> {
        self.document.generated_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(&self.document)?;

        write_atomic(&self.path, content.as_bytes())
            .map_err(|e| WeaveError::lock_save(&self.path, e))?;

        info!("Saved lock file {}", self.path.display());
        Ok(())
    }

    /// Delete the lock file and reset to an empty document
    pub fn clear_lock_file(&mut self) -> WeaveResult<bool> {
        let removed = match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                return Err(WeaveError::io(
                    format!("removing lock file {}", self.path.display()),
                    e,
                ))
            }
        };

        self.document = LockDocument::new();
        if removed {
            info!("Cleared lock file {}", self.path.display());
        }
        Ok(removed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &TraitLayout {
        &self.layout
    }

    pub fn document(&self) -> &LockDocument {
        &self.document
    }

    pub fn global_checksums(&self) -> &GlobalChecksums {
        &self.document.global_checksums
    }

    /// Record for a repository, if one was ever written
    pub fn repository(&self, name: &str) -> Option<&RepositoryRecord> {
        self.document.repositories.get(name)
    }

    /// Names of every recorded repository
    pub fn repository_names(&self) -> impl Iterator<Item = &str> {
        self.document.repositories.keys().map(String::as_str)
    }

    /// Apply a partial update, creating the record on first touch
    pub fn update_repository(&mut self, name: &str, update: RecordUpdate) {
        let now = Utc::now();
        let record = self
            .document
            .repositories
            .entry(name.to_string())
            .or_insert_with(|| RepositoryRecord::new(now));

        update.apply(record);
        record.last_processed_at = now;
    }

    /// Merge into the global checksums
    pub fn update_global_checksums(&mut self, update: GlobalUpdate) {
        update.apply(&mut self.document.global_checksums);
        self.document.generated_at = Some(Utc::now());
    }

    /// Remove a repository record entirely
    pub fn clear_repository(&mut self, name: &str) -> bool {
        let removed = self.document.repositories.remove(name).is_some();
        if removed {
            info!("Cleared cached state for {}", name);
        }
        removed
    }

    /// Remove every record whose name is not in `keep`
    pub fn prune<S: AsRef<str>>(&mut self, keep: &[S]) -> Vec<String> {
        let orphaned: Vec<String> = self
            .document
            .repositories
            .keys()
            .filter(|name| !keep.iter().any(|k| k.as_ref() == name.as_str()))
            .cloned()
            .collect();

        for name in &orphaned {
            self.clear_repository(name);
        }
        orphaned
    }

    /// Whether the repository list changed since the stored hash
    pub fn has_config_file_changed(&self) -> bool {
        self.config_file_changed_since(&self.document.global_checksums)
    }

    /// Whether the repository list differs from `reference`
    pub fn config_file_changed_since(&self, reference: &GlobalChecksums) -> bool {
        let current = file_checksum(&self.config_file);
        let changed = current != reference.config_file_hash;
        if changed {
            debug!("Configuration {} changed", self.config_file.display());
        }
        changed
    }

    /// Whether any hook script or settings file of `traits` changed
    pub fn have_trait_scripts_changed<S: AsRef<str>>(&self, traits: &[S], phase: Phase) -> bool {
        self.trait_scripts_changed_since(&self.document.global_checksums, traits, phase)
    }

    /// Like `have_trait_scripts_changed`, against `reference`
    pub fn trait_scripts_changed_since<S: AsRef<str>>(
        &self,
        reference: &GlobalChecksums,
        traits: &[S],
        phase: Phase,
    ) -> bool {
        for trait_name in traits {
            for (key, path) in self.layout.tracked_files(trait_name.as_ref(), phase) {
                let current = file_checksum(&path);
                let stored = reference.trait_script_hashes.get(&key);
                if current.as_ref() != stored {
                    debug!("Trait file {} changed", key);
                    return true;
                }
            }
        }
        false
    }

    /// Current hashes of the shared files one phase of a repository reads
    ///
    /// Trait files that do not exist have no key.
    pub fn phase_inputs<S: AsRef<str>>(&self, traits: &[S], phase: Phase) -> PhaseInputs {
        let trait_script_hashes = traits
            .iter()
            .flat_map(|t| self.layout.tracked_files(t.as_ref(), phase))
            .filter_map(|(key, path)| file_checksum(&path).map(|hash| (key, hash)))
            .collect();

        PhaseInputs {
            config_file_hash: file_checksum(&self.config_file),
            trait_script_hashes,
        }
    }

    /// Store the current hash of the repository list
    pub fn refresh_config_checksum(&mut self) {
        let hash = file_checksum(&self.config_file);
        self.update_global_checksums(GlobalUpdate::new().config_file_hash(hash));
    }

    /// Recompute and store hashes for the given traits and phases
    ///
    /// Files that no longer exist lose their key.
    pub fn update_trait_script_checksums<S: AsRef<str>>(&mut self, traits: &[S], phases: &[Phase]) {
        let mut hashes: BTreeMap<String, String> =
            self.document.global_checksums.trait_script_hashes.clone();

        for trait_name in traits {
            for phase in phases {
                for (key, path) in self.layout.tracked_files(trait_name.as_ref(), *phase) {
                    match file_checksum(&path) {
                        Some(hash) => {
                            hashes.insert(key, hash);
                        }
                        None => {
                            hashes.remove(&key);
                        }
                    }
                }
            }
        }

        self.update_global_checksums(GlobalUpdate::new().trait_script_hashes(hashes));
    }

    /// Summary of the document and the file backing it
    pub fn stats(&self) -> LockStats {
        LockStats {
            repository_count: self.document.repositories.len(),
            tracked_script_count: self.document.global_checksums.trait_script_hashes.len(),
            last_generated: self.document.generated_at,
            format_version: self.document.format_version.clone(),
            file_size_bytes: fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0),
        }
    }
}

fn read_document(path: &Path) -> (LockDocument, LoadOutcome) {
    let recovered = |reason: String| (LockDocument::new(), LoadOutcome::Recovered { reason });

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return (LockDocument::new(), LoadOutcome::Initialized)
        }
        Err(e) => return recovered(format!("cannot read file: {}", e)),
    };

    let value: Value = match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => return recovered(format!("invalid JSON: {}", e)),
    };

    let issues = inspect_document(&value);
    if !issues.structural.is_empty() {
        return recovered(issues.structural.join("; "));
    }
    for issue in &issues.metadata {
        warn!("Lock file {}: {}", path.display(), issue);
    }

    match serde_json::from_value::<LockDocument>(value) {
        Ok(document) => (document, LoadOutcome::Loaded),
        Err(e) => recovered(format!("invalid record: {}", e)),
    }
}

/// Write `bytes` to a temporary sibling, then rename it over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_sibling(path);
    let result = (|| -> io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lock".to_string());
    path.with_file_name(format!("{}.{}.tmp", name, Uuid::new_v4().simple()))
}
