//! Precomputed repository fingerprints
//!
//! Hashing a working tree is the expensive part of a post-clone decision.
//! Snapshots let the CLI hash every repository in parallel on the blocking
//! pool, then hand the results to the single-threaded cache manager.

use crate::cache::manifests::dependency_checksums;
use crate::checksum::{directory_checksum, ExclusionSet};
use crate::error::{WeaveError, WeaveResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::task::JoinSet;
use tracing::debug;

/// Content and dependency fingerprints of one working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySnapshot {
    pub name: String,
    pub path: PathBuf,
    pub content_checksum: Option<String>,
    pub dependency_files: BTreeMap<String, String>,
}

impl RepositorySnapshot {
    /// Hash a working directory now
    pub fn capture(name: impl Into<String>, path: impl Into<PathBuf>, excludes: &ExclusionSet) -> Self {
        let name = name.into();
        let path = path.into();
        let content_checksum = directory_checksum(&path, excludes);
        let dependency_files = dependency_checksums(&path);

        debug!(
            "Captured {}: content {}, {} dependency files",
            name,
            content_checksum.as_deref().unwrap_or("none"),
            dependency_files.len()
        );

        Self {
            name,
            path,
            content_checksum,
            dependency_files,
        }
    }
}

/// Capture snapshots for many repositories in parallel
///
/// Results are returned in input order.
pub async fn capture_all(
    targets: Vec<(String, PathBuf)>,
    excludes: &ExclusionSet,
) -> WeaveResult<Vec<RepositorySnapshot>> {
    let mut tasks = JoinSet::new();

    for (index, (name, path)) in targets.into_iter().enumerate() {
        let excludes = excludes.clone();
        tasks.spawn_blocking(move || (index, RepositorySnapshot::capture(name, path, &excludes)));
    }

    let mut captured = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let entry = joined
            .map_err(|e| WeaveError::Internal(format!("snapshot task failed: {}", e)))?;
        captured.push(entry);
    }

    captured.sort_by_key(|(index, _)| *index);
    Ok(captured.into_iter().map(|(_, snapshot)| snapshot).collect())
}
