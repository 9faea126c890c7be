//! Pure formatting functions for UI output.
//!
//! `format_*` functions build the text; `display_*` functions print it.
//! Colors come from `console` and are dropped automatically when the output
//! is not a terminal.

use crate::boundary::BoundaryWarning;
use crate::lint::{LintReport, LintedCommit};
use crate::release::{ReleaseOutcome, ReleasePlan, SyncStatus};
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning, with its follow-up command when it has one.
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow().bold(), warning);
    if let Some(command) = warning.follow_up() {
        eprintln!("  Run: {}", style(command).cyan());
    }
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

/// One commit's verdict: a mark, its label and header, then each violation.
pub fn format_linted_commit(commit: &LintedCommit) -> String {
    let header = first_line(&commit.message);
    if commit.verdict.accepted {
        let mark = if commit.verdict.bypassed {
            style("○").dim()
        } else {
            style("✓").green()
        };
        return format!("{} {} {}", mark, style(&commit.label).dim(), header);
    }

    let mut out = format!("{} {} {}", style("✗").red(), style(&commit.label).dim(), header);
    for violation in &commit.verdict.violations {
        out.push_str(&format!(
            "\n    {} {} {}",
            style("-").red(),
            violation.message,
            style(format!("[{}]", violation.rule)).dim()
        ));
    }
    out
}

/// Every verdict followed by a one-line summary.
pub fn format_lint_report(report: &LintReport) -> String {
    let mut lines: Vec<String> = report.commits.iter().map(format_linted_commit).collect();

    let total = report.commits.len();
    let rejected = report.rejected_count();
    let summary = if rejected == 0 {
        style(format!("{} commit(s) checked, all accepted", total))
            .green()
            .to_string()
    } else {
        style(format!(
            "{} commit(s) checked, {} rejected",
            total, rejected
        ))
        .red()
        .to_string()
    };
    lines.push(summary);
    lines.join("\n")
}

pub fn display_lint_report(report: &LintReport) {
    println!("{}", format_lint_report(report));
}

/// Version change, channel, sync edge and the notes fragment of a plan.
pub fn format_release_plan(plan: &ReleasePlan) -> String {
    let mut out = format!(
        "{}\n",
        style(format!("Release plan for branch '{}'", plan.branch)).bold()
    );

    match &plan.previous {
        Some(previous) => out.push_str(&format!(
            "  Version: {} -> {} ({})\n",
            style(previous).red(),
            style(&plan.version).green(),
            plan.level
        )),
        None => out.push_str(&format!(
            "  Version: {} (initial release)\n",
            style(&plan.version).green()
        )),
    }
    out.push_str(&format!("  Tag:     {}\n", plan.tag));
    out.push_str(&format!(
        "  Channel: {}\n",
        plan.channel.as_deref().unwrap_or("default")
    ));
    if let Some(sync) = &plan.sync {
        out.push_str(&format!("  Sync:    {} -> {}\n", sync.from, sync.to));
    }
    out.push('\n');
    out.push_str(&plan.changelog);
    out
}

pub fn display_release_plan(plan: &ReleasePlan) {
    println!("{}", format_release_plan(plan));
}

/// Result of an executed release.
pub fn format_release_outcome(outcome: &ReleaseOutcome) -> String {
    let plan = &outcome.plan;
    let mut out = format!(
        "{} Released {} from branch {}",
        style("✓").green(),
        style(&plan.tag).bold(),
        plan.branch
    );
    if let Some(channel) = &plan.channel {
        out.push_str(&format!(" on channel {}", channel));
    }
    if let (SyncStatus::Completed, Some(sync)) = (&outcome.sync, &plan.sync) {
        out.push_str(&format!(
            "\n{} Merged {} into {}",
            style("✓").green(),
            sync.from,
            sync.to
        ));
    }
    out
}

pub fn display_release_outcome(outcome: &ReleaseOutcome) {
    println!("{}", format_release_outcome(outcome));
}
