//! Content fingerprints for files and directory trees
//!
//! A file fingerprint is the SHA-256 of its bytes. A directory fingerprint
//! is the SHA-256 of the sorted `relative/path:hash` tokens of every
//! eligible file, so it does not depend on the order in which the
//! filesystem enumerates entries.
//!
//! Neither function returns an error: a missing input yields `None`, and
//! an unreadable one is logged and yields `None` (file) or is left out of
//! the tree (directory). Callers treat `None` as "changed".

pub mod exclude;
pub mod walk;

pub use exclude::{ExclusionRule, ExclusionSet, DEFAULT_EXCLUDES};
pub use walk::{TreeFile, TreeWalk};

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::Path;
use tracing::{debug, warn};

/// Separator between tokens of a directory fingerprint
const TOKEN_DELIMITER: &str = "\n";

/// Hex-encoded SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Fingerprint a single file
///
/// Returns `None` when the file does not exist, and `None` plus a warning
/// when it exists but cannot be read.
pub fn file_checksum(path: &Path) -> Option<String> {
    match hash_file(path) {
        Ok(hash) => Some(hash),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(
                "Cannot read {} ({}), treating it as changed",
                path.display(),
                e
            );
            None
        }
    }
}

fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint a directory tree, skipping excluded entries
///
/// Returns `None` when the directory does not exist or holds no eligible
/// files.
pub fn directory_checksum(path: &Path, excludes: &ExclusionSet) -> Option<String> {
    if !path.is_dir() {
        debug!("No directory at {}, no content checksum", path.display());
        return None;
    }

    let excludes = excludes.clone();
    let digest = digest_tree(TreeWalk::new(path, move |name| excludes.is_excluded(name)));

    if digest.is_none() {
        debug!("No eligible files under {}", path.display());
    }
    digest
}

/// Combine the files of a walk into one order-independent digest
pub fn digest_tree<I>(files: I) -> Option<String>
where
    I: IntoIterator<Item = TreeFile>,
{
    let mut tokens = Vec::new();

    for file in files {
        match file.contents {
            Ok(bytes) => tokens.push(format!("{}:{}", file.relative_path, sha256_hex(&bytes))),
            Err(e) => warn!(
                "Leaving unreadable file {} out of the checksum: {}",
                file.relative_path, e
            ),
        }
    }

    if tokens.is_empty() {
        return None;
    }

    tokens.sort_unstable();
    debug!("Hashed {} files", tokens.len());
    Some(sha256_hex(tokens.join(TOKEN_DELIMITER).as_bytes()))
}
