//! Skip decisions and post-run bookkeeping
//!
//! `CacheManager` owns the `LockStore` for one run. Decisions read the
//! store and the filesystem; updates write fresh evidence into the store.
//! Nothing reaches disk until `save`.

use crate::cache::decision::{Decision, Dimension, RunReason};
use crate::cache::options::CacheOptions;
use crate::cache::report::{CacheReport, CacheStats, RepositoryReport};
use crate::cache::snapshot::RepositorySnapshot;
use crate::checksum::{file_checksum, ExclusionSet};
use crate::config::{HookValue, ProjectPaths, RepositoryDef};
use crate::error::WeaveResult;
use crate::lock::{
    GlobalChecksums, IntegrityReport, LockStore, PhaseStatus, RecordUpdate, RepositoryRecord,
};
use crate::phase::Phase;
use crate::ui::{self, UiContext};
use chrono::Utc;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Decides which phases can be skipped and records what ran
pub struct CacheManager {
    store: LockStore,
    options: CacheOptions,
    excludes: ExclusionSet,
    repos_dir: PathBuf,
    custom_dir: PathBuf,
    /// Global checksums as loaded, before any refresh in this run
    baseline: GlobalChecksums,
    /// (repository, phase) pairs recorded successfully in this run
    refreshed: HashSet<(String, Phase)>,
    snapshots: HashMap<String, RepositorySnapshot>,
}

impl CacheManager {
    pub fn new(
        store: LockStore,
        options: CacheOptions,
        excludes: ExclusionSet,
        paths: &ProjectPaths,
    ) -> Self {
        let baseline = store.global_checksums().clone();
        Self {
            store,
            options,
            excludes,
            repos_dir: paths.repos_dir.clone(),
            custom_dir: paths.custom_dir.clone(),
            baseline,
            refreshed: HashSet::new(),
            snapshots: HashMap::new(),
        }
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn into_store(self) -> LockStore {
        self.store
    }

    pub fn should_force_execution(&self, phase: Phase) -> bool {
        self.options.should_force(phase)
    }

    /// Where a repository is checked out
    pub fn working_dir(&self, repo: &RepositoryDef) -> PathBuf {
        repo.working_dir(&self.repos_dir)
    }

    /// Where a repository's file-based custom hook lives
    pub fn custom_script_path(&self, repo: &str, script: &Path) -> PathBuf {
        self.custom_dir.join(repo).join(script)
    }

    /// Decide whether `phase` can be skipped for `repo`
    ///
    /// Checks run in a fixed order and the first that fails decides. Does
    /// not log; see `can_skip_pre_clone` and `can_skip_post_clone`.
    pub fn evaluate(&self, repo: &RepositoryDef, phase: Phase) -> Decision {
        if let Some(reason) = self.options.force_reason(phase) {
            return Decision::Run(reason);
        }

        let Some(record) = self.store.repository(&repo.name) else {
            return Decision::Run(RunReason::NoRecord);
        };
        match record.status(phase) {
            Some(PhaseStatus::Success) => {}
            Some(PhaseStatus::Failed) => return Decision::Run(RunReason::PreviousFailed),
            None => return Decision::Run(RunReason::NeverSucceeded),
        }

        let mut verified = Vec::new();
        let (config_drift, trait_drift) = self.shared_input_drift(repo, record, phase);

        if config_drift {
            return Decision::Run(RunReason::ConfigChanged);
        }
        verified.push(Dimension::Configuration);

        if trait_drift {
            return Decision::Run(RunReason::TraitScriptsChanged);
        }
        verified.push(Dimension::TraitScripts);

        if let Some(script) = repo.hooks.get(phase).and_then(HookValue::script_file) {
            let current = file_checksum(&self.custom_script_path(&repo.name, script));
            if current.as_ref() != record.custom_scripts.get(&phase) {
                return Decision::Run(RunReason::CustomScriptChanged);
            }
            verified.push(Dimension::CustomScript);
        }

        if phase == Phase::PostClone {
            let snapshot = self.fingerprints(repo);
            let content_drift = content_changed(&snapshot, record);
            let dependency_drift = snapshot.dependency_files != record.dependency_files;

            // A manifest edit also moves the content checksum; report the
            // narrower cause
            if dependency_drift {
                return Decision::Run(RunReason::DependenciesChanged);
            }
            if content_drift {
                return Decision::Run(RunReason::ContentChanged);
            }
            verified.push(Dimension::Content);
            verified.push(Dimension::Dependencies);
        }

        Decision::Skip { verified }
    }

    /// Whether the pre-clone phase can be skipped, logging the decision
    pub fn can_skip_pre_clone(&self, repo: &RepositoryDef) -> bool {
        self.decide_and_log(repo, Phase::PreClone)
    }

    /// Whether the post-clone phase can be skipped, logging the decision
    pub fn can_skip_post_clone(&self, repo: &RepositoryDef) -> bool {
        self.decide_and_log(repo, Phase::PostClone)
    }

    fn decide_and_log(&self, repo: &RepositoryDef, phase: Phase) -> bool {
        let decision = self.evaluate(repo, phase);
        info!("{} {}: {}", repo.name, phase, decision);
        decision.can_skip()
    }

    /// Whether the working tree or manifests differ from the last record
    pub fn has_repository_changed(&self, repo: &RepositoryDef) -> bool {
        match self.store.repository(&repo.name) {
            Some(record) => {
                let snapshot = self.fingerprints(repo);
                content_changed(&snapshot, record)
                    || snapshot.dependency_files != record.dependency_files
            }
            None => true,
        }
    }

    /// Use a precomputed snapshot for the next decisions about a repository
    pub fn prime(&mut self, snapshot: RepositorySnapshot) {
        self.snapshots.insert(snapshot.name.clone(), snapshot);
    }

    /// Record the outcome of a phase
    ///
    /// A success stores fresh evidence for that phase only. A failure
    /// stores only the status so the next run cannot skip the phase.
    pub fn update_after_success(&mut self, repo: &RepositoryDef, phase: Phase, success: bool) {
        if self.options.no_cache {
            debug!("Cache disabled, not recording {} {}", repo.name, phase);
            return;
        }

        let status = if success {
            PhaseStatus::Success
        } else {
            PhaseStatus::Failed
        };
        let mut update = RecordUpdate::new()
            .phase(phase, status, Utc::now())
            .traits(repo.traits.clone());

        if success {
            update = update
                .custom_script(phase, self.custom_script_hash(repo, phase))
                .phase_inputs(phase, self.store.phase_inputs(&repo.traits, phase));

            if phase == Phase::PostClone {
                // The hook may have changed the tree since the snapshot
                self.snapshots.remove(&repo.name);
                let snapshot = RepositorySnapshot::capture(
                    repo.name.as_str(),
                    self.working_dir(repo),
                    &self.excludes,
                );
                update = update
                    .content_checksum(snapshot.content_checksum)
                    .dependency_files(snapshot.dependency_files);
            }
        }

        self.store.update_repository(&repo.name, update);

        let key = (repo.name.clone(), phase);
        if success {
            self.store.refresh_config_checksum();
            self.store
                .update_trait_script_checksums(&repo.traits, Phase::all());
            self.refreshed.insert(key);
            info!("Recorded {} {} as succeeded", repo.name, phase);
        } else {
            self.refreshed.remove(&key);
            info!("Recorded {} {} as failed", repo.name, phase);
        }
    }

    pub fn update_after_failure(&mut self, repo: &RepositoryDef, phase: Phase) {
        self.update_after_success(repo, phase, false);
    }

    /// Persist the lock document
    ///
    /// Returns whether anything was written; dry runs and disabled caches
    /// never write.
    pub fn save(&mut self) -> WeaveResult<bool> {
        if self.options.dry_run {
            info!("Dry run, lock file {} not written", self.store.path().display());
            return Ok(false);
        }
        if self.options.no_cache {
            debug!("Cache disabled, lock file not written");
            return Ok(false);
        }

        self.store.save()?;
        Ok(true)
    }

    /// Counts of skippable phases across `repos`
    pub fn cache_stats(&self, repos: &[&RepositoryDef]) -> CacheStats {
        CacheStats::from_report(&self.cache_report(repos), self.store.stats())
    }

    /// Decisions for every phase of every repository in `repos`
    pub fn cache_report(&self, repos: &[&RepositoryDef]) -> CacheReport {
        let repositories = repos
            .iter()
            .map(|repo| {
                let record = self.store.repository(&repo.name);
                RepositoryReport {
                    name: repo.name.clone(),
                    has_record: record.is_some(),
                    last_processed_at: record.map(|r| r.last_processed_at),
                    pre_clone: self.evaluate(repo, Phase::PreClone),
                    post_clone: self.evaluate(repo, Phase::PostClone),
                }
            })
            .collect();

        CacheReport {
            lock_path: self.store.path().to_path_buf(),
            options: self.options,
            repositories,
        }
    }

    /// Print the cache report
    pub fn display_cache_info(&self, ctx: &UiContext, repos: &[&RepositoryDef]) {
        let report = self.cache_report(repos);
        report.print(ctx);
        CacheStats::from_report(&report, self.store.stats()).print(ctx);
        if self.options.dry_run {
            ui::remark(ctx, "Dry run: the lock file will not be modified");
        }
    }

    /// Lock integrity plus warnings for records with no configured repository
    pub fn integrity_report(&self, repos: &[&RepositoryDef]) -> IntegrityReport {
        let mut report = self.store.validate_integrity();

        for name in self.store.repository_names() {
            if !repos.iter().any(|r| r.name == name) {
                report.warnings.push(format!(
                    "orphaned record '{}' has no configured repository",
                    name
                ));
            }
        }
        report
    }

    /// Configuration and trait drift for one phase of a record
    ///
    /// Compared against the inputs the phase last succeeded with. Records
    /// without them (written before they were tracked) fall back to the
    /// global checksums.
    fn shared_input_drift(
        &self,
        repo: &RepositoryDef,
        record: &RepositoryRecord,
        phase: Phase,
    ) -> (bool, bool) {
        let Some(stored) = record.phase_inputs.get(&phase) else {
            let reference = self.reference_checksums(&repo.name, phase);
            return (
                self.store.config_file_changed_since(reference),
                self.store
                    .trait_scripts_changed_since(reference, &repo.traits, phase),
            );
        };

        let current = self.store.phase_inputs(&repo.traits, phase);
        let config_drift = current.config_file_hash != stored.config_file_hash;
        let trait_drift = current.trait_script_hashes != stored.trait_script_hashes;
        if config_drift || trait_drift {
            debug!(
                "{} {} inputs drifted (config: {}, traits: {})",
                repo.name, phase, config_drift, trait_drift
            );
        }
        (config_drift, trait_drift)
    }

    /// Globals a (repository, phase) pair is compared against
    fn reference_checksums(&self, name: &str, phase: Phase) -> &GlobalChecksums {
        if self.refreshed.contains(&(name.to_string(), phase)) {
            self.store.global_checksums()
        } else {
            &self.baseline
        }
    }

    /// Primed snapshot for the repository, or a fresh capture
    fn fingerprints(&self, repo: &RepositoryDef) -> Cow<'_, RepositorySnapshot> {
        let path = self.working_dir(repo);
        match self.snapshots.get(&repo.name) {
            Some(snapshot) if snapshot.path == path => Cow::Borrowed(snapshot),
            _ => Cow::Owned(RepositorySnapshot::capture(
                repo.name.as_str(),
                path,
                &self.excludes,
            )),
        }
    }

    /// Hash of the file-based custom hook for `phase`, if there is one
    fn custom_script_hash(&self, repo: &RepositoryDef, phase: Phase) -> Option<String> {
        let script = repo.hooks.get(phase).and_then(HookValue::script_file)?;
        file_checksum(&self.custom_script_path(&repo.name, script))
    }
}

/// Content drift, with a missing checksum on either side counting as drift
fn content_changed(snapshot: &RepositorySnapshot, record: &RepositoryRecord) -> bool {
    match (&snapshot.content_checksum, &record.content_checksum) {
        (Some(current), Some(stored)) => current != stored,
        _ => true,
    }
}
