//! A project root with its resolved settings
//!
//! Ties configuration, run options and the lock file together for the
//! CLI commands.

use crate::cache::{CacheManager, CacheOptions};
use crate::checksum::ExclusionSet;
use crate::config::{Config, ProjectPaths, RepositoryList};
use crate::error::WeaveResult;
use crate::lock::{LoadOutcome, LockStore, TraitLayout};
use std::path::PathBuf;
use tracing::{debug, info};

/// Settings for one invocation against a project root
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config: Config,
    pub paths: ProjectPaths,
    pub options: CacheOptions,
}

impl Workspace {
    /// Resolve paths and options
    ///
    /// `lock_file` overrides the configured lock path. A disabled cache
    /// in configuration behaves like `no_cache`.
    pub fn new(
        root: PathBuf,
        config: Config,
        lock_file: Option<PathBuf>,
        mut options: CacheOptions,
    ) -> Self {
        let mut paths = config.project_paths(&root);
        if let Some(lock_file) = lock_file {
            paths.lock_file = root.join(lock_file);
        }
        if !config.cache.enabled {
            debug!("Cache disabled in configuration");
            options.no_cache = true;
        }

        Self {
            config,
            paths,
            options,
        }
    }

    /// Read the repository list
    pub async fn repositories(&self) -> WeaveResult<RepositoryList> {
        RepositoryList::from_file(&self.paths.repos_file).await
    }

    /// Built-in exclusions plus configured ones
    pub fn excludes(&self) -> WeaveResult<ExclusionSet> {
        ExclusionSet::with_patterns(&self.config.cache.exclude)
    }

    pub fn trait_layout(&self) -> TraitLayout {
        TraitLayout::new(
            &self.paths.traits_dir,
            &self.config.cache.script_extension,
            &self.config.cache.trait_settings_file,
        )
    }

    /// Lock store for this workspace, not yet loaded
    pub fn lock_store(&self) -> LockStore {
        LockStore::new(
            &self.paths.lock_file,
            &self.paths.repos_file,
            self.trait_layout(),
        )
    }

    /// Load the lock file and build a cache manager over it
    ///
    /// With `clear_lock` the file is deleted first. A dry run leaves the
    /// file alone and starts from an empty document instead.
    pub fn open_cache(&self) -> WeaveResult<(CacheManager, LoadOutcome)> {
        let mut store = self.lock_store();

        let outcome = match (self.options.clear_lock, self.options.dry_run) {
            (true, true) => {
                info!("Dry run, lock file {} kept", self.paths.lock_file.display());
                LoadOutcome::Initialized
            }
            (true, false) => {
                store.clear_lock_file()?;
                store.load()
            }
            _ => store.load(),
        };

        let manager = CacheManager::new(store, self.options, self.excludes()?, &self.paths);
        Ok((manager, outcome))
    }
}
