//! Plan command - show which phases would run and why

use super::report_load_outcome;
use crate::cache::capture_all;
use crate::cli::args::{OutputFormat, PlanArgs};
use crate::error::WeaveResult;
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;
use tracing::debug;

/// Execute the plan command
pub async fn execute(args: PlanArgs, ws: &Workspace) -> WeaveResult<()> {
    let ctx = UiContext::detect();
    let list = ws.repositories().await?;
    let repos = list.select(&args.repositories)?;

    let (mut manager, outcome) = ws.open_cache()?;
    if args.format == OutputFormat::Table {
        report_load_outcome(&ctx, &outcome);
    }

    let targets = repos
        .iter()
        .map(|repo| (repo.name.clone(), manager.working_dir(repo)))
        .collect();
    for snapshot in capture_all(targets, &ws.excludes()?).await? {
        manager.prime(snapshot);
    }
    debug!("Primed {} snapshots", repos.len());

    let report = manager.cache_report(&repos);

    match args.format {
        OutputFormat::Table => {
            report.print(&ctx);
            println!();
            let total = repos.len() * 2;
            let pending = report.pending_phases();
            ui::key_value_status(
                &ctx,
                "Plan",
                &format!("{} of {} phases will run", pending, total),
                pending == 0,
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for line in report.plain_lines() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
