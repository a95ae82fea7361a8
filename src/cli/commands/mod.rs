//! CLI command implementations

pub mod clear;
pub mod config;
pub mod plan;
pub mod record;
pub mod status;
pub mod verify;

pub use clear::execute as clear;
pub use config::execute as config;
pub use plan::execute as plan;
pub use record::execute as record;
pub use status::execute as status;
pub use verify::execute as verify;

use crate::lock::LoadOutcome;
use crate::ui::{self, UiContext};

/// Tell the user when cached state was discarded on load
fn report_load_outcome(ctx: &UiContext, outcome: &LoadOutcome) {
    if let LoadOutcome::Recovered { reason } = outcome {
        ui::step_warn_hint(
            ctx,
            &format!("Lock file was unusable ({})", reason),
            "every phase will run",
        );
    }
}
