//! Verify command - check lock file integrity

use crate::error::{WeaveError, WeaveResult};
use crate::lock::LoadOutcome;
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;

/// Execute the verify command
///
/// Fails when the document is invalid or had to be replaced on load.
pub async fn execute(ws: &Workspace) -> WeaveResult<()> {
    let ctx = UiContext::detect();
    let list = ws.repositories().await?;
    let repos = list.select(&[])?;
    let (manager, outcome) = ws.open_cache()?;
    let report = manager.integrity_report(&repos);

    ui::section(&ctx, &format!("Verifying {}", ws.paths.lock_file.display()));

    let mut problems = report.errors.len();
    match &outcome {
        LoadOutcome::Recovered { reason } => {
            ui::step_error(&ctx, &format!("Lock file is unusable: {}", reason));
            problems += 1;
        }
        LoadOutcome::Initialized => ui::step_info(&ctx, "No lock file yet"),
        LoadOutcome::Loaded => {}
    }

    for error in &report.errors {
        ui::step_error(&ctx, error);
    }
    for warning in &report.warnings {
        ui::step_warn(&ctx, warning);
    }

    if problems > 0 {
        return Err(WeaveError::LockInvalid(format!(
            "{} problem(s) found in {}",
            problems,
            ws.paths.lock_file.display()
        )));
    }

    ui::step_ok(&ctx, "Lock file is valid");
    Ok(())
}
