//! Persistent lock state
//!
//! The lock file records, per repository, which setup phases succeeded and
//! the checksums captured right after they did, plus checksums shared by
//! every repository (the repository list and trait scripts).
//!
//! # Load outcomes
//!
//! | Outcome | Cause | Effect |
//! |---------|-------|--------|
//! | Loaded | File parsed | Cached evidence is used |
//! | Recovered | Unreadable, malformed or mistyped file | Empty document, full re-run |
//! | Initialized | No file | Empty document, full re-run |

pub mod document;
pub mod store;

pub use document::{
    GlobalChecksums, GlobalUpdate, LockDocument, PhaseInputs, PhaseStatus, RecordUpdate,
    RepositoryRecord, FORMAT_VERSION,
};
pub use store::{IntegrityReport, LoadOutcome, LockStats, LockStore, TraitLayout};
