//! Detects whether output goes to a person or a pipeline
//!
//! `plan --format plain`, CI jobs and scripts wrapping repoweave get
//! bracketed tags and never see a prompt; a terminal gets symbols, colors
//! and the confirmation before `clear` removes the lock file.

use std::io::IsTerminal;

/// Environment variables set by common CI services
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "BUILDKITE",
    "TEAMCITY_VERSION",
    "TF_BUILD",
];

/// Output behavior for one invocation
#[derive(Debug, Clone)]
pub struct UiContext {
    /// A person is at the terminal and can answer prompts
    interactive: bool,
    /// `clear --yes`: confirmations are answered yes without asking
    auto_yes: bool,
}

impl UiContext {
    /// Inspect the terminal and environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
            auto_yes: false,
        }
    }

    /// Plain output; prompts return their default unless `auto_yes`
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Whether to use symbols and colors instead of bracketed tags
    ///
    /// `NO_COLOR` and `CLICOLOR=0` turn symbols off even on a terminal.
    pub fn use_fancy_output(&self) -> bool {
        self.interactive && console::colors_enabled()
    }

    /// Both ends are terminals and no CI service is detected
    fn detect_interactive() -> bool {
        std::io::stdout().is_terminal()
            && std::io::stdin().is_terminal()
            && !CI_VARS.iter().any(|var| std::env::var_os(var).is_some())
    }
}
