//! Configuration management for repoweave

pub mod repos;
pub mod schema;

pub use repos::{HookSet, HookValue, RepositoryDef, RepositoryList};
pub use schema::{Config, ProjectPaths};

use crate::error::{WeaveError, WeaveResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Project settings file name, looked up at the project root
pub const PROJECT_CONFIG_FILE: &str = "repoweave.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a config manager for a project root
    pub fn new(root: &Path) -> Self {
        Self {
            config_path: root.join(PROJECT_CONFIG_FILE),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// User-wide settings layered under every project
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("repoweave").join("config.toml"))
    }

    /// Load project configuration, using defaults if it does not exist
    pub async fn load(&self) -> WeaveResult<Config> {
        self.load_merged(None).await
    }

    /// Load configuration with `global` settings underneath the project's
    ///
    /// Either file may be missing. Tables are merged key by key, so a
    /// project file only needs the settings it overrides.
    pub async fn load_merged(&self, global: Option<&Path>) -> WeaveResult<Config> {
        let mut merged = toml::Table::new();

        if let Some(path) = global {
            if let Some(table) = read_table(path).await? {
                debug!("Loaded global config: {}", path.display());
                merge_tables(&mut merged, table);
            }
        }

        match read_table(&self.config_path).await? {
            Some(table) => {
                debug!("Loaded project config: {}", self.config_path.display());
                merge_tables(&mut merged, table);
            }
            None => debug!("Config file not found, using defaults"),
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| WeaveError::ConfigInvalid {
                path: self.config_path.clone(),
                reason: e.to_string(),
            })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> WeaveResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            WeaveError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> WeaveResult<()> {
        if let Some(parent) = self.config_path.parent() {
            if parent.as_os_str().is_empty() {
                return Ok(());
            }
            fs::create_dir_all(parent)
                .await
                .map_err(|e| WeaveError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

async fn read_table(path: &Path) -> WeaveResult<Option<toml::Table>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| WeaveError::io(format!("reading config from {}", path.display()), e))?;

    content
        .parse::<toml::Table>()
        .map(Some)
        .map_err(|e| WeaveError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Overlay `overlay` onto `base`, recursing into nested tables
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::new(temp.path());

        let config = manager.load().await.unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.paths.repos_file, PathBuf::from("repos.toml"));
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::new(temp.path());

        let mut config = Config::default();
        config.paths.lock_file = PathBuf::from("state/custom.lock");

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.paths.lock_file, PathBuf::from("state/custom.lock"));
    }

    #[tokio::test]
    async fn project_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        tokio::fs::write(
            &global,
            "[cache]\nenabled = false\nscript_extension = \"bash\"\n",
        )
        .await
        .unwrap();
        tokio::fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[cache]\nenabled = true\n",
        )
        .await
        .unwrap();

        let config = ConfigManager::new(temp.path())
            .load_merged(Some(&global))
            .await
            .unwrap();

        assert!(config.cache.enabled);
        assert_eq!(config.cache.script_extension, "bash");
    }

    #[tokio::test]
    async fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        tokio::fs::write(temp.path().join(PROJECT_CONFIG_FILE), "[cache]\nenabled = \"yes\"\n")
            .await
            .unwrap();

        let err = ConfigManager::new(temp.path()).load().await.unwrap_err();
        assert!(matches!(err, WeaveError::ConfigInvalid { .. }));
    }
}
