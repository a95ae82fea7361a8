//! Dependency manifest detection and hashing
//!
//! Detects package manifests and lock files at a repository root across
//! several ecosystems. Their hashes are stored after a successful
//! post-clone run; any difference means dependencies must be reinstalled.

use crate::checksum::file_checksum;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported package ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// npm (package.json, package-lock.json, npm-shrinkwrap.json)
    Npm,
    /// Yarn (yarn.lock)
    Yarn,
    /// pnpm (pnpm-lock.yaml)
    Pnpm,
    /// Cargo/Rust (Cargo.toml, Cargo.lock)
    Cargo,
    /// pip/Python (requirements files)
    Pip,
    /// Pipenv/Python (Pipfile, Pipfile.lock)
    Pipenv,
    /// Poetry/Python (pyproject.toml, poetry.lock)
    Poetry,
    /// Go modules (go.mod, go.sum)
    Go,
    /// Bundler/Ruby (Gemfile, Gemfile.lock)
    Bundler,
    /// Composer/PHP (composer.json, composer.lock)
    Composer,
    /// Maven/Java (pom.xml)
    Maven,
    /// Gradle/JVM (build.gradle, build.gradle.kts, gradle.lockfile)
    Gradle,
}

impl Ecosystem {
    /// Manifest and lock file names for this ecosystem
    pub fn manifest_files(&self) -> &'static [&'static str] {
        match self {
            Self::Npm => &["package.json", "package-lock.json", "npm-shrinkwrap.json"],
            Self::Yarn => &["yarn.lock"],
            Self::Pnpm => &["pnpm-lock.yaml"],
            Self::Cargo => &["Cargo.toml", "Cargo.lock"],
            Self::Pip => &["requirements.txt", "requirements-dev.txt"],
            Self::Pipenv => &["Pipfile", "Pipfile.lock"],
            Self::Poetry => &["pyproject.toml", "poetry.lock"],
            Self::Go => &["go.mod", "go.sum"],
            Self::Bundler => &["Gemfile", "Gemfile.lock"],
            Self::Composer => &["composer.json", "composer.lock"],
            Self::Maven => &["pom.xml"],
            Self::Gradle => &["build.gradle", "build.gradle.kts", "gradle.lockfile"],
        }
    }

    /// All ecosystems in detection order
    pub fn all() -> &'static [Self] {
        &[
            Self::Npm,
            Self::Yarn,
            Self::Pnpm,
            Self::Cargo,
            Self::Pip,
            Self::Pipenv,
            Self::Poetry,
            Self::Go,
            Self::Bundler,
            Self::Composer,
            Self::Maven,
            Self::Gradle,
        ]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Cargo => "cargo",
            Self::Pip => "pip",
            Self::Pipenv => "pipenv",
            Self::Poetry => "poetry",
            Self::Go => "go",
            Self::Bundler => "bundler",
            Self::Composer => "composer",
            Self::Maven => "maven",
            Self::Gradle => "gradle",
        };
        write!(f, "{}", name)
    }
}

/// Every file name checked at a repository root
pub fn known_manifest_files() -> impl Iterator<Item = &'static str> {
    Ecosystem::all()
        .iter()
        .flat_map(|e| e.manifest_files().iter().copied())
}

/// Information about a detected manifest
#[derive(Debug, Clone)]
pub struct ManifestInfo {
    /// The ecosystem this manifest belongs to
    pub ecosystem: Ecosystem,
    /// File name at the repository root
    pub file_name: &'static str,
    /// Path to the manifest
    pub path: PathBuf,
    /// SHA-256 of the manifest contents
    pub hash: String,
}

/// Detect every readable manifest at the repository root
pub fn detect_manifests(repo_dir: &Path) -> Vec<ManifestInfo> {
    let mut manifests = Vec::new();

    for ecosystem in Ecosystem::all() {
        for file_name in ecosystem.manifest_files() {
            let path = repo_dir.join(file_name);
            if !path.is_file() {
                continue;
            }

            // Unreadable files are logged by file_checksum and stay absent,
            // which compares as changed against any stored hash
            if let Some(hash) = file_checksum(&path) {
                debug!("Found {} manifest: {}", ecosystem, path.display());
                manifests.push(ManifestInfo {
                    ecosystem: *ecosystem,
                    file_name,
                    path,
                    hash,
                });
            }
        }
    }

    debug!("Detected {} manifests", manifests.len());
    manifests
}

/// File name to hash for every manifest at the repository root
pub fn dependency_checksums(repo_dir: &Path) -> BTreeMap<String, String> {
    detect_manifests(repo_dir)
        .into_iter()
        .map(|m| (m.file_name.to_string(), m.hash))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn ecosystem_display() {
        assert_eq!(Ecosystem::Npm.to_string(), "npm");
        assert_eq!(Ecosystem::Cargo.to_string(), "cargo");
        assert_eq!(Ecosystem::Bundler.to_string(), "bundler");
    }

    #[test]
    fn manifest_names_are_unique() {
        let names: Vec<_> = known_manifest_files().collect();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.contains(&"package.json"));
        assert!(names.contains(&"go.sum"));
    }

    #[test]
    fn detect_npm_manifests() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "test"}"#).unwrap();
        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();

        let manifests = detect_manifests(dir.path());

        assert_eq!(manifests.len(), 2);
        assert!(manifests.iter().all(|m| m.ecosystem == Ecosystem::Npm));
        assert_eq!(manifests[0].path, dir.path().join("package.json"));
    }

    #[test]
    fn detect_multiple_ecosystems() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), "{}").unwrap();
        fs::write(dir.path().join("Cargo.lock"), "").unwrap();
        fs::write(dir.path().join("go.mod"), "module x").unwrap();

        let checksums = dependency_checksums(dir.path());

        assert_eq!(checksums.len(), 3);
        assert!(checksums.contains_key("package.json"));
        assert!(checksums.contains_key("Cargo.lock"));
        assert!(checksums.contains_key("go.mod"));
    }

    #[test]
    fn nested_manifests_are_not_detected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("web")).unwrap();
        fs::write(dir.path().join("web/package.json"), "{}").unwrap();

        assert!(dependency_checksums(dir.path()).is_empty());
    }

    #[test]
    fn directory_named_like_manifest_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Gemfile")).unwrap();

        assert!(detect_manifests(dir.path()).is_empty());
    }

    #[test]
    fn hash_changes_with_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, "{\"version\": 1}").unwrap();
        let before = dependency_checksums(dir.path());

        fs::write(&path, "{\"version\": 2}").unwrap();
        let after = dependency_checksums(dir.path());

        assert_ne!(before["package.json"], after["package.json"]);
    }

    #[test]
    fn detect_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(detect_manifests(dir.path()).is_empty());
        assert!(detect_manifests(&dir.path().join("missing")).is_empty());
    }
}
