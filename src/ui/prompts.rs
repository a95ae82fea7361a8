//! Confirmation prompts with a non-interactive fallback

use super::context::UiContext;
use crate::error::{WeaveError, WeaveResult};

/// Ask a yes/no question
///
/// `--yes` answers yes. Without a terminal (pipes, CI) nothing is asked and
/// `default` is returned.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> WeaveResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| WeaveError::User(format!("Prompt task failed: {}", e)))?;

    answer.map_err(|e| WeaveError::User(format!("Prompt failed: {}", e)))
}
