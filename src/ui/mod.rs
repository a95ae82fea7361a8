//! Terminal output helpers
//!
//! Every command prints through these so interactive and CI output stay
//! consistent.
//!
//! # Example
//!
//! ```rust,ignore
//! use repoweave::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! ui::section(&ctx, "Lock file");
//! ui::step_ok(&ctx, "Integrity verified");
//! ui::step_warn_hint(&ctx, "alpha postClone run", "dependency files changed");
//!
//! if ui::confirm(&ctx, "Remove the lock file?", false).await? {
//!     // ...
//! }
//! ```

mod context;
mod output;
mod prompts;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, remark, section, step_error, step_info, step_ok,
    step_ok_detail, step_warn, step_warn_hint, title,
};
pub use prompts::confirm;
