//! Status command - cached state and lock file statistics

use super::report_load_outcome;
use crate::error::WeaveResult;
use crate::lock::LoadOutcome;
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;

/// Execute the status command
pub async fn execute(ws: &Workspace) -> WeaveResult<()> {
    let ctx = UiContext::detect();
    let list = ws.repositories().await?;
    let repos = list.select(&[])?;
    let (manager, outcome) = ws.open_cache()?;

    ui::title(&ctx, "repoweave status");
    ui::key_value(&ctx, "Root", &ws.paths.root.display().to_string());
    ui::key_value(&ctx, "Lock file", &ws.paths.lock_file.display().to_string());

    match &outcome {
        LoadOutcome::Loaded => ui::key_value_status(&ctx, "State", "loaded", true),
        LoadOutcome::Initialized => ui::key_value_status(&ctx, "State", "no lock file yet", true),
        LoadOutcome::Recovered { .. } => report_load_outcome(&ctx, &outcome),
    }
    if ws.options.no_cache {
        ui::key_value_status(&ctx, "Cache", "disabled", false);
    }

    manager.display_cache_info(&ctx, &repos);

    let integrity = manager.integrity_report(&repos);
    for warning in &integrity.warnings {
        ui::step_warn(&ctx, warning);
    }
    if !integrity.valid {
        ui::step_warn_hint(&ctx, "Lock file has integrity problems", "Run: repoweave verify");
    }

    Ok(())
}
