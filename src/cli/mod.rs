//! Command-line interface for release-gate.

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::config::{load_config, Config};
use crate::git::Git2Repository;
use crate::lint::LintReport;
use crate::ui;

pub mod orchestration;

use orchestration::{lint_message, lint_range, prepare_release, run_release, ReleaseArgs};

/// Exit code when every commit passed and the command succeeded
pub const EXIT_OK: i32 = 0;
/// Exit code when at least one commit was rejected
pub const EXIT_REJECTED: i32 = 1;
/// Exit code for configuration and runtime errors
pub const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "release-gate")]
#[command(about = "Lint commit messages and cut releases from conventional commits")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check commit messages against the commit policy
    Lint {
        #[arg(
            long,
            conflicts_with_all = ["from", "to"],
            help = "Message file to check, as passed to a commit-msg hook"
        )]
        edit: Option<PathBuf>,

        #[arg(long, help = "Check commits after this revision")]
        from: Option<String>,

        #[arg(long, help = "Check commits up to this revision [default: HEAD]")]
        to: Option<String>,
    },

    /// Show what the next release would be, without changing anything
    Plan {
        #[arg(short, long, help = "Branch to plan for [default: current branch]")]
        branch: Option<String>,
    },

    /// Cut a release from the current branch
    Release {
        #[arg(short, long, help = "Branch to release [default: current branch]")]
        branch: Option<String>,

        #[arg(long, help = "Preview what would happen without making changes")]
        dry_run: bool,

        #[arg(long, help = "Do not fetch or push")]
        no_push: bool,

        #[arg(short, long, help = "Skip confirmation prompts")]
        yes: bool,
    },

    /// Print the effective configuration
    Config,
}

impl Cli {
    /// Run the command and return the process exit code.
    pub fn execute(self) -> Result<i32> {
        let config = load_config(self.config.as_deref()).context("Error loading config")?;

        match self.command {
            Commands::Lint { edit, from, to } => lint(&config, edit, from, to),
            Commands::Plan { branch } => plan(&config, branch),
            Commands::Release {
                branch,
                dry_run,
                no_push,
                yes,
            } => release(
                &config,
                ReleaseArgs {
                    branch,
                    dry_run,
                    push: !no_push,
                },
                yes,
            ),
            Commands::Config => {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(EXIT_OK)
            }
        }
    }
}

fn report_exit_code(report: &LintReport) -> i32 {
    if report.passed() {
        EXIT_OK
    } else {
        EXIT_REJECTED
    }
}

fn open_repository() -> Result<Git2Repository> {
    Git2Repository::open(".").context("Not inside a git repository")
}

fn lint(
    config: &Config,
    edit: Option<PathBuf>,
    from: Option<String>,
    to: Option<String>,
) -> Result<i32> {
    let report = if let Some(path) = edit {
        let message = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        lint_message(config, &path.display().to_string(), &message)?
    } else if from.is_some() || to.is_some() {
        let repo = open_repository()?;
        let to = to.unwrap_or_else(|| "HEAD".to_string());
        lint_range(&repo, config, from.as_deref(), &to)?
    } else {
        let mut message = String::new();
        io::stdin().read_to_string(&mut message)?;
        lint_message(config, "stdin", &message)?
    };

    ui::display_lint_report(&report);
    Ok(report_exit_code(&report))
}

fn plan(config: &Config, branch: Option<String>) -> Result<i32> {
    let repo = open_repository()?;
    let branch = match branch {
        Some(branch) => branch,
        None => crate::git::Repository::current_branch(&repo)?,
    };

    let prepared = prepare_release(&repo, config, &branch, Local::now().date_naive())?;

    if !prepared.report.passed() {
        ui::display_lint_report(&prepared.report);
        if config.release.block_on_rejected {
            return Ok(EXIT_REJECTED);
        }
    }

    match &prepared.plan {
        Some(plan) => ui::display_release_plan(plan),
        None => ui::display_status(&format!(
            "No release: commits on '{}' since {} do not warrant one",
            branch,
            prepared.last_tag.as_deref().unwrap_or("the beginning")
        )),
    }
    Ok(EXIT_OK)
}

fn release(config: &Config, args: ReleaseArgs, yes: bool) -> Result<i32> {
    let repo = open_repository()?;
    let today = Local::now().date_naive();

    if !args.dry_run && !yes && console::user_attended() {
        let preview = run_release(
            &repo,
            config,
            &ReleaseArgs {
                dry_run: true,
                push: false,
                ..args.clone()
            },
            today,
        )?;
        if let Some(plan) = &preview.prepared.plan {
            ui::display_release_plan(plan);
            if !ui::confirm_action(&format!("Publish {}?", plan.tag))? {
                println!("Operation cancelled by user.");
                return Ok(EXIT_OK);
            }
        }
    }

    let run = run_release(&repo, config, &args, today)?;

    for warning in &run.warnings {
        ui::display_boundary_warning(warning);
    }

    if run.rejected() {
        ui::display_lint_report(&run.prepared.report);
        if config.release.block_on_rejected {
            return Ok(EXIT_REJECTED);
        }
    }

    match (&run.outcome, &run.prepared.plan) {
        (Some(outcome), _) => ui::display_release_outcome(outcome),
        (None, Some(plan)) => {
            ui::display_status("Dry run, nothing was changed:");
            ui::display_release_plan(plan);
        }
        (None, None) => ui::display_status("Nothing to release."),
    }

    Ok(EXIT_OK)
}
