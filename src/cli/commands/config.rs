//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{WeaveError, WeaveResult};
use crate::ui::{self, UiContext};
use std::path::Path;

const REPOS_TEMPLATE: &str = r#"# Repositories managed by repoweave
#
# [[repositories]]
# name = "alpha"
# url = "git@example.com:team/alpha.git"
# traits = ["node"]
#
# [repositories.hooks]
# preClone = "prepare.sh"
# postClone = "npm ci"
"#;

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
    root: &Path,
) -> WeaveResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => {
            init_config(manager, force).await?;
            init_repository_list(&config.project_paths(root).repos_file).await?;
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> WeaveResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
    if let Some(global) = ConfigManager::global_config_path() {
        println!("{} (global)", global.display());
    }
}

async fn init_config(manager: &ConfigManager, force: bool) -> WeaveResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Write a commented repository list unless one exists
async fn init_repository_list(path: &Path) -> WeaveResult<()> {
    if path.exists() {
        return Ok(());
    }

    let ctx = UiContext::detect();
    tokio::fs::write(path, REPOS_TEMPLATE).await.map_err(|e| {
        WeaveError::io(format!("writing repository list {}", path.display()), e)
    })?;

    ui::step_ok_detail(&ctx, "Repository list created", &path.display().to_string());
    Ok(())
}
