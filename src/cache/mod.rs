//! Change detection for setup phases
//!
//! Decides whether a repository's pre-clone or post-clone hooks can be
//! skipped because nothing they depend on changed since they last
//! succeeded. A skip is only allowed when every dimension matches; any
//! missing evidence means the phase runs.
//!
//! # Dimensions
//!
//! | Dimension | Phases | Evidence |
//! |-----------|--------|----------|
//! | Configuration | both | Hash of the repository list |
//! | Trait scripts | both | Hook script and settings file of each trait |
//! | Custom script | both | File-based custom hook, if declared |
//! | Content | postClone | Directory checksum of the working tree |
//! | Dependencies | postClone | Hash of each manifest at the repository root |

pub mod decision;
pub mod manager;
pub mod manifests;
pub mod options;
pub mod report;
pub mod snapshot;

pub use decision::{Decision, Dimension, RunReason};
pub use manager::CacheManager;
pub use manifests::{dependency_checksums, detect_manifests, Ecosystem, ManifestInfo};
pub use options::CacheOptions;
pub use report::{format_bytes, CacheReport, CacheStats, RepositoryReport};
pub use snapshot::{capture_all, RepositorySnapshot};
