//! Lazy directory traversal
//!
//! Yields every regular file under a root together with its contents,
//! pruning excluded entries before descending into them. The walk is
//! finite and single-pass; create a new `TreeWalk` to traverse again.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A file produced by a tree walk
#[derive(Debug)]
pub struct TreeFile {
    /// Path relative to the walk root, `/`-separated on every platform
    pub relative_path: String,

    /// File contents, or the error raised while reading them
    pub contents: io::Result<Vec<u8>>,
}

/// Iterator over the eligible files beneath a root directory
pub struct TreeWalk {
    root: PathBuf,
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
}

impl TreeWalk {
    /// Walk `root` in the filesystem's native entry order
    ///
    /// `exclude` receives the bare name of each entry below the root and
    /// returns true to prune it (and its subtree, for directories).
    pub fn new<F>(root: &Path, exclude: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        Self::from_walkdir(root, WalkDir::new(root), exclude)
    }

    /// Walk `root` visiting sibling entries in the order given by `compare`
    pub fn sorted_by<F, C>(root: &Path, exclude: F, compare: C) -> Self
    where
        F: Fn(&str) -> bool + 'static,
        C: FnMut(&DirEntry, &DirEntry) -> Ordering + Send + Sync + 'static,
    {
        Self::from_walkdir(root, WalkDir::new(root).sort_by(compare), exclude)
    }

    fn from_walkdir<F>(root: &Path, walker: WalkDir, exclude: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        let entries = walker
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| {
                // The root is never pruned, even if its own name matches
                entry.depth() == 0 || !exclude(&entry.file_name().to_string_lossy())
            });

        Self {
            root: root.to_path_buf(),
            entries: Box::new(entries),
        }
    }
}

impl Iterator for TreeWalk {
    type Item = TreeFile;

    fn next(&mut self) -> Option<TreeFile> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        "Skipping unreadable entry under {}: {}",
                        self.root.display(),
                        e
                    );
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(relative_path) = relative_key(&self.root, entry.path()) else {
                debug!("Entry outside walk root: {}", entry.path().display());
                continue;
            };

            let contents = fs::read(entry.path());
            return Some(TreeFile {
                relative_path,
                contents,
            });
        }
    }
}

/// Platform-independent relative key for `path` under `root`
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(walk: TreeWalk) -> Vec<String> {
        let mut paths: Vec<String> = walk.map(|f| f.relative_path).collect();
        paths.sort();
        paths
    }

    #[test]
    fn yields_nested_files_with_forward_slashes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("README.md"), "readme").unwrap();
        fs::write(dir.path().join("src/nested/lib.rs"), "fn main() {}").unwrap();

        let walk = TreeWalk::new(dir.path(), |_| false);
        assert_eq!(paths(walk), vec!["README.md", "src/nested/lib.rs"]);
    }

    #[test]
    fn prunes_excluded_directories_at_any_depth() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join("packages/web/node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(dir.path().join("packages/web/node_modules/a.js"), "x").unwrap();
        fs::write(dir.path().join("packages/web/app.js"), "x").unwrap();

        let walk = TreeWalk::new(dir.path(), |name| name == "node_modules");
        assert_eq!(paths(walk), vec!["packages/web/app.js"]);
    }

    #[test]
    fn root_is_never_pruned() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("build");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("main.c"), "int main;").unwrap();

        let walk = TreeWalk::new(&root, |name| name == "build");
        assert_eq!(paths(walk), vec!["main.c"]);
    }

    #[test]
    fn yields_contents() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        let files: Vec<TreeFile> = TreeWalk::new(dir.path(), |_| false).collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].contents.as_ref().unwrap(), b"alpha");
    }

    #[test]
    fn walk_is_single_pass() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();

        let mut walk = TreeWalk::new(dir.path(), |_| false);
        assert!(walk.next().is_some());
        assert!(walk.next().is_none());
        assert!(walk.next().is_none());
    }

    #[test]
    fn relative_key_of_root_is_none() {
        let root = Path::new("/repo");
        assert_eq!(relative_key(root, root), None);
        assert_eq!(
            relative_key(root, Path::new("/repo/a/b.txt")),
            Some("a/b.txt".to_string())
        );
        assert_eq!(relative_key(root, Path::new("/elsewhere/b.txt")), None);
    }
}
