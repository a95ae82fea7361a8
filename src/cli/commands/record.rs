//! Record command - store the outcome of a phase

use super::report_load_outcome;
use crate::cli::args::RecordArgs;
use crate::error::{WeaveError, WeaveResult};
use crate::phase::Phase;
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;

/// Execute the record command
pub async fn execute(args: RecordArgs, ws: &Workspace) -> WeaveResult<()> {
    let ctx = UiContext::detect();
    let list = ws.repositories().await?;
    let repo = list
        .get(&args.repository)
        .ok_or_else(|| WeaveError::RepositoryNotFound(args.repository.clone()))?;
    let phase = Phase::from(args.phase);

    let (mut manager, outcome) = ws.open_cache()?;
    report_load_outcome(&ctx, &outcome);

    if args.failed {
        manager.update_after_failure(repo, phase);
    } else {
        manager.update_after_success(repo, phase, true);
    }

    let saved = manager.save()?;
    let verb = if args.failed { "failed" } else { "succeeded" };

    if saved {
        ui::step_ok(&ctx, &format!("Recorded {} {} as {}", repo.name, phase, verb));
    } else if ws.options.no_cache {
        ui::step_info(&ctx, "Cache disabled, nothing recorded");
    } else {
        ui::step_info(
            &ctx,
            &format!("Dry run: {} {} would be recorded as {}", repo.name, phase, verb),
        );
    }

    Ok(())
}
