//! Read-only views over cache decisions

use crate::cache::decision::Decision;
use crate::cache::options::CacheOptions;
use crate::lock::LockStats;
use crate::phase::Phase;
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::path::PathBuf;

/// Format bytes as human-readable size (e.g., "1.5 KB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Aggregate counts over a set of repositories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_repositories: usize,
    /// Repositories with any lock record
    pub cached_repositories: usize,
    pub pre_clone_skippable: usize,
    pub post_clone_skippable: usize,
    pub lock: LockStats,
}

impl CacheStats {
    /// Count the decisions of an already built report
    pub fn from_report(report: &CacheReport, lock: LockStats) -> Self {
        let count = |phase: Phase| {
            report
                .repositories
                .iter()
                .filter(|r| r.decision(phase).can_skip())
                .count()
        };

        Self {
            total_repositories: report.repositories.len(),
            cached_repositories: report.repositories.iter().filter(|r| r.has_record).count(),
            pre_clone_skippable: count(Phase::PreClone),
            post_clone_skippable: count(Phase::PostClone),
            lock,
        }
    }

    pub fn print(&self, ctx: &UiContext) {
        ui::section(ctx, "Lock file");
        ui::key_value(
            ctx,
            "Repositories",
            &format!(
                "{} configured, {} recorded",
                self.total_repositories, self.lock.repository_count
            ),
        );
        ui::key_value(
            ctx,
            "Skippable",
            &format!(
                "preClone {}/{}, postClone {}/{}",
                self.pre_clone_skippable,
                self.total_repositories,
                self.post_clone_skippable,
                self.total_repositories
            ),
        );
        ui::key_value(
            ctx,
            "Trait files tracked",
            &self.lock.tracked_script_count.to_string(),
        );
        ui::key_value(ctx, "Format version", &self.lock.format_version);
        ui::key_value(ctx, "Size", &format_bytes(self.lock.file_size_bytes));
        if let Some(generated) = self.lock.last_generated {
            ui::key_value(ctx, "Generated", &generated.to_rfc3339());
        }
    }
}

/// Decisions for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryReport {
    pub name: String,
    pub has_record: bool,
    pub last_processed_at: Option<DateTime<Utc>>,
    pub pre_clone: Decision,
    pub post_clone: Decision,
}

impl RepositoryReport {
    pub fn decision(&self, phase: Phase) -> &Decision {
        match phase {
            Phase::PreClone => &self.pre_clone,
            Phase::PostClone => &self.post_clone,
        }
    }
}

/// Decisions for a set of repositories
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheReport {
    pub lock_path: PathBuf,
    #[serde(skip)]
    pub options: CacheOptions,
    pub repositories: Vec<RepositoryReport>,
}

impl CacheReport {
    /// Number of phases that will run
    pub fn pending_phases(&self) -> usize {
        self.repositories
            .iter()
            .flat_map(|r| Phase::all().iter().map(move |p| r.decision(*p)))
            .filter(|d| !d.can_skip())
            .count()
    }

    /// One line per repository phase, for scripts
    pub fn plain_lines(&self) -> Vec<String> {
        self.repositories
            .iter()
            .flat_map(|r| {
                Phase::all().iter().map(move |phase| {
                    let decision = r.decision(*phase);
                    let action = if decision.can_skip() { "skip" } else { "run" };
                    match decision.reason() {
                        Some(reason) => format!("{}\t{}\t{}\t{}", r.name, phase, action, reason),
                        None => format!("{}\t{}\t{}", r.name, phase, action),
                    }
                })
            })
            .collect()
    }

    pub fn print(&self, ctx: &UiContext) {
        ui::section(ctx, "Cache decisions");

        if self.repositories.is_empty() {
            ui::remark(ctx, "No repositories configured");
            return;
        }

        for repo in &self.repositories {
            println!();
            println!("  {}", style(&repo.name).bold());
            for phase in Phase::all() {
                print_decision(ctx, *phase, repo.decision(*phase));
            }
            match repo.last_processed_at {
                Some(at) => ui::remark(ctx, &format!("last processed {}", at.to_rfc3339())),
                None => ui::remark(ctx, "never processed"),
            }
        }
    }
}

fn print_decision(ctx: &UiContext, phase: Phase, decision: &Decision) {
    match decision {
        Decision::Skip { .. } => {
            ui::step_ok_detail(ctx, &format!("{} skip", phase), &decision.to_string())
        }
        Decision::Run(reason) if reason.is_forced() => {
            ui::step_info(ctx, &format!("{} run ({})", phase, reason))
        }
        Decision::Run(reason) => {
            ui::step_warn_hint(ctx, &format!("{} run", phase), &reason.to_string())
        }
    }
}
