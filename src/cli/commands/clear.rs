//! Clear command - remove cached state

use crate::cli::args::ClearArgs;
use crate::error::WeaveResult;
use crate::lock::LockStore;
use crate::ui::{self, UiContext};
use crate::workspace::Workspace;
use console::style;
use tracing::debug;

/// Execute the clear command
pub async fn execute(args: ClearArgs, ws: &Workspace) -> WeaveResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let mut store = ws.lock_store();

    if let Some(name) = args.repository {
        store.load();
        if !store.clear_repository(&name) {
            ui::step_warn(&ctx, &format!("No cached state for {}", name));
            return Ok(());
        }
        return save(ws, &mut store, &ctx, &format!("Cleared cached state for {}", name));
    }

    if args.orphaned {
        let list = ws.repositories().await?;
        store.load();
        let removed = store.prune(list.names().as_slice());
        if removed.is_empty() {
            ui::step_info(&ctx, "No orphaned records");
            return Ok(());
        }
        for name in &removed {
            println!("  {} {}", style("•").red(), name);
        }
        return save(
            ws,
            &mut store,
            &ctx,
            &format!("Removed {} orphaned record(s)", removed.len()),
        );
    }

    clear_lock_file(ws, &mut store, &ctx).await
}

async fn clear_lock_file(
    ws: &Workspace,
    store: &mut LockStore,
    ctx: &UiContext,
) -> WeaveResult<()> {
    let path = ws.paths.lock_file.display().to_string();

    if !ws.paths.lock_file.exists() {
        ui::step_info(ctx, &format!("No lock file at {}", path));
        return Ok(());
    }
    if ws.options.dry_run {
        ui::step_info(ctx, &format!("Dry run: {} would be removed", path));
        return Ok(());
    }
    let prompt = format!("Remove {}? Every phase will run again.", path);
    if !ui::confirm(ctx, &prompt, false).await? {
        println!("Aborted.");
        return Ok(());
    }

    store.clear_lock_file()?;
    ui::step_ok_detail(ctx, "Lock file removed", &path);
    Ok(())
}

fn save(ws: &Workspace, store: &mut LockStore, ctx: &UiContext, message: &str) -> WeaveResult<()> {
    if ws.options.dry_run {
        debug!("Dry run, not saving");
        ui::step_info(ctx, &format!("Dry run: {}", message.to_lowercase()));
        return Ok(());
    }

    store.save()?;
    ui::step_ok(ctx, message);
    Ok(())
}
