//! Workflow orchestration
//!
//! Glues the engine (classifier, bump resolver, notes composer, release flow)
//! to a [`Repository`] and the configured hooks. Everything here is generic
//! over the repository so it runs against [`crate::git::MockRepository`] in
//! tests. Argument parsing and printing stay in the CLI layer.

use crate::boundary::BoundaryWarning;
use crate::changelog;
use crate::config::Config;
use crate::domain::{strip_git_comments, BranchRole, SyncRequest};
use crate::error::{ReleaseGateError, Result};
use crate::git::{branch_refspec, tag_refspec, Repository};
use crate::hooks::{HookContext, HookExecutor, HookType};
use crate::lint::{lint_batch, Classifier, LintReport};
use crate::release::{
    decide, execute, ReleaseCollaborator, ReleaseDecision, ReleaseFlow, ReleaseHistory,
    ReleaseOutcome, ReleasePlan, SyncStatus,
};
use chrono::NaiveDate;
use git2::Oid;
use tracing::{debug, info, warn};

/// Lint a single message, as given to a `commit-msg` hook.
///
/// Git comment lines are stripped first.
pub fn lint_message(config: &Config, label: &str, message: &str) -> Result<LintReport> {
    let classifier = Classifier::new(&config.lint)?;
    Ok(lint_batch(
        &classifier,
        [(label.to_string(), strip_git_comments(message))],
    ))
}

/// Lint every commit reachable from `to` but not from `from`.
pub fn lint_range<R: Repository>(
    repo: &R,
    config: &Config,
    from: Option<&str>,
    to: &str,
) -> Result<LintReport> {
    let classifier = Classifier::new(&config.lint)?;
    let from_oid = from.map(|rev| repo.resolve_revision(rev)).transpose()?;
    let to_oid = repo.resolve_revision(to)?;

    let commits = repo.get_commits_between(from_oid, to_oid)?;
    Ok(lint_batch(
        &classifier,
        commits
            .into_iter()
            .map(|c| (c.short_hash().to_string(), c.message)),
    ))
}

/// Everything known about a branch before anything is changed
#[derive(Debug, Clone)]
pub struct PreparedRelease {
    pub branch: String,
    pub role: BranchRole,
    pub head: Oid,
    pub history: ReleaseHistory,
    /// Tag of the release the commit range starts after
    pub last_tag: Option<String>,
    /// Verdicts for the commits since `last_tag`
    pub report: LintReport,
    /// Decided from the accepted commits only
    pub decision: ReleaseDecision,
    /// `None` when nothing is worth releasing, or when commits were rejected
    /// and `release.block_on_rejected` is set
    pub plan: Option<ReleasePlan>,
}

/// Build the release plan for `branch` from its history.
///
/// Only tags reachable from the branch head count as releases of that branch.
/// Rejected commits are left out of the decision and reported; they only stop
/// the plan when `release.block_on_rejected` is set.
pub fn prepare_release<R: Repository>(
    repo: &R,
    config: &Config,
    branch: &str,
    date: NaiveDate,
) -> Result<PreparedRelease> {
    let flow = ReleaseFlow::new(&config.release)?;
    let role = flow.role_of(branch)?;
    let head = repo.get_branch_head_oid(branch)?;

    let mut reachable = Vec::new();
    for tag in repo.list_tags()? {
        if !flow.tag_pattern().matches(&tag) {
            continue;
        }
        if let Some(oid) = repo.find_tag_oid(&tag)? {
            if repo.is_ancestor(oid, head)? {
                reachable.push(tag);
            }
        }
    }
    let history = ReleaseHistory::from_tags(
        &reachable,
        flow.tag_pattern(),
        &config.release.branches.prerelease_id,
    );

    let last_tag = history
        .last_release(role)
        .map(|version| flow.tag_pattern().format(version));
    let from = match &last_tag {
        Some(tag) => repo.find_tag_oid(tag)?,
        None => None,
    };
    debug!(branch, last_tag = ?last_tag, "collecting commits since last release");

    let commits = repo.get_commits_between(from, head)?;
    let classifier = Classifier::new(&config.lint)?;
    let report = lint_batch(
        &classifier,
        commits
            .into_iter()
            .map(|c| (c.short_hash().to_string(), c.message)),
    );

    let decision = decide(&report.accepted_records(), &config.release);
    let blocked = config.release.block_on_rejected && !report.passed();
    let plan = if blocked {
        info!(
            branch,
            rejected = report.rejected_count(),
            "rejected commits block the release"
        );
        None
    } else {
        flow.plan(branch, &decision, &history, date)?
    };

    Ok(PreparedRelease {
        branch: branch.to_string(),
        role,
        head,
        history,
        last_tag,
        report,
        decision,
        plan,
    })
}

/// Arguments for the release workflow
///
/// Mirrors the CLI flags but does not depend on clap, so the workflow can be
/// driven programmatically.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseArgs {
    /// Branch to release; the checked-out branch when absent
    pub branch: Option<String>,

    /// Plan only, change nothing
    pub dry_run: bool,

    /// Fetch before planning and push the release afterwards
    pub push: bool,
}

/// Result of the release workflow
#[derive(Debug, Clone)]
pub struct ReleaseRun {
    pub prepared: PreparedRelease,
    /// Present only when a release was actually published
    pub outcome: Option<ReleaseOutcome>,
    pub warnings: Vec<BoundaryWarning>,
}

impl ReleaseRun {
    pub fn rejected(&self) -> bool {
        !self.prepared.report.passed()
    }
}

/// Publishes through git and the configured hooks
pub struct GitCollaborator<'a, R: Repository> {
    repo: &'a R,
    config: &'a Config,
    push: bool,
}

impl<'a, R: Repository> GitCollaborator<'a, R> {
    pub fn new(repo: &'a R, config: &'a Config, push: bool) -> Self {
        GitCollaborator { repo, config, push }
    }
}

impl<R: Repository> ReleaseCollaborator for GitCollaborator<'_, R> {
    fn publish(&mut self, plan: &ReleasePlan) -> Result<()> {
        let release = &self.config.release;
        let workdir = self.repo.workdir()?;

        changelog::prepend_to_file(&workdir.join(&release.changelog_file), &plan.changelog)?;

        let prepare = HookContext::for_plan(HookType::Prepare, plan, &release.remote);
        HookExecutor::run_optional(self.config.hooks.prepare.as_deref(), &prepare, &workdir)?;

        let commit = self.repo.commit_paths(&release.assets, &plan.message)?;
        self.repo.create_tag(&plan.tag, commit)?;
        info!(tag = %plan.tag, %commit, "tagged release");

        if self.push {
            self.repo.push(
                &release.remote,
                &[branch_refspec(&plan.branch), tag_refspec(&plan.tag)],
            )?;
        }

        let publish = HookContext::for_plan(HookType::Publish, plan, &release.remote);
        HookExecutor::run_optional(self.config.hooks.publish.as_deref(), &publish, &workdir)?;

        Ok(())
    }

    fn synchronize(&mut self, request: &SyncRequest) -> Result<()> {
        self.repo.merge_branch(&request.from, &request.to)?;
        if self.push {
            self.repo
                .push(&self.config.release.remote, &[branch_refspec(&request.to)])?;
        }
        Ok(())
    }
}

/// Main release workflow
///
/// 1. Resolve the branch and check it is a release branch
/// 2. Fetch from the remote when pushing (failure is a warning)
/// 3. Lint the commits since the last release and plan the release
/// 4. Run the verify-conditions hook
/// 5. Publish, then backmerge when the branch calls for it
pub fn run_release<R: Repository>(
    repo: &R,
    config: &Config,
    args: &ReleaseArgs,
    date: NaiveDate,
) -> Result<ReleaseRun> {
    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => repo.current_branch()?,
    };
    ReleaseFlow::new(&config.release)?.role_of(&branch)?;

    let mut warnings = Vec::new();

    if args.push {
        if let Err(e) = repo.fetch_from_remote(&config.release.remote) {
            warn!(remote = %config.release.remote, error = %e, "fetch failed");
            warnings.push(BoundaryWarning::FetchFailed {
                remote: config.release.remote.clone(),
                reason: e.to_string(),
            });
        }
    }

    if !args.dry_run {
        let current = repo.current_branch()?;
        if current != branch {
            return Err(ReleaseGateError::branch(format!(
                "Releasing '{}' requires it to be checked out (current: '{}')",
                branch, current
            )));
        }
    }

    let prepared = prepare_release(repo, config, &branch, date)?;

    if prepared.report.commits.is_empty() {
        warnings.push(BoundaryWarning::NoNewCommits {
            last_tag: prepared.last_tag.clone(),
            current_commit_hash: prepared.head.to_string(),
        });
    }
    if !prepared.report.passed() {
        warnings.push(BoundaryWarning::RejectedCommits {
            count: prepared.report.rejected_count(),
        });
    }

    let plan = match (&prepared.plan, args.dry_run) {
        (Some(plan), false) => plan.clone(),
        _ => {
            return Ok(ReleaseRun {
                prepared,
                outcome: None,
                warnings,
            })
        }
    };

    let workdir = repo.workdir()?;
    let verify = HookContext::for_plan(HookType::VerifyConditions, &plan, &config.release.remote);
    HookExecutor::run_optional(
        config.hooks.verify_conditions.as_deref(),
        &verify,
        &workdir,
    )?;

    let mut collaborator = GitCollaborator::new(repo, config, args.push);
    let outcome = execute(plan, &mut collaborator)?;

    if let (SyncStatus::Failed { reason }, Some(sync)) = (&outcome.sync, &outcome.plan.sync) {
        warnings.push(BoundaryWarning::SyncFailed {
            from: sync.from.clone(),
            to: sync.to.clone(),
            reason: reason.clone(),
        });
    }

    Ok(ReleaseRun {
        prepared,
        outcome: Some(outcome),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReleaseLevel;
    use crate::git::MockRepository;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_lint_message_strips_comments() {
        let report = lint_message(
            &Config::default(),
            "COMMIT_EDITMSG",
            "fix: Handle nulls.\n# Please enter the commit message\n",
        )
        .unwrap();
        assert!(report.passed());
    }

    #[test]
    fn test_lint_range() {
        let repo = MockRepository::new();
        let first = repo.add_commit("release", "feat: First.");
        repo.add_commit("release", "fix: bad");
        repo.add_commit("release", "fix: Good.");
        repo.add_tag("start", first);

        let report = lint_range(&repo, &Config::default(), Some("start"), "release").unwrap();
        assert_eq!(report.commits.len(), 2);
        assert_eq!(report.rejected_count(), 1);
    }

    #[test]
    fn test_prepare_ignores_unreachable_tags() {
        let repo = MockRepository::new();
        let base = repo.add_commit("release", "feat: First.");
        repo.add_tag("v1.0.0", base);
        repo.create_branch("release-candidate", "release").unwrap();
        let rc = repo.add_commit("release-candidate", "feat: Candidate.");
        repo.add_tag("v1.1.0-rc.1", rc);
        repo.add_commit("release", "fix: Hotfix.");

        let prepared = prepare_release(&repo, &Config::default(), "release", date()).unwrap();
        assert_eq!(prepared.history.latest_prerelease, None);
        assert_eq!(prepared.last_tag.as_deref(), Some("v1.0.0"));
        assert_eq!(prepared.report.commits.len(), 1);
        assert_eq!(prepared.plan.unwrap().tag, "v1.0.1");
    }

    #[test]
    fn test_prepare_plans_from_accepted_commits() {
        let repo = MockRepository::new();
        let base = repo.add_commit("release", "feat: Initial import.");
        repo.add_tag("v1.0.0", base);
        repo.add_commit("release", "fix: Fix crash on empty input.");
        repo.add_commit("release", "oops typo");

        let prepared = prepare_release(&repo, &Config::default(), "release", date()).unwrap();
        assert!(!prepared.report.passed());
        assert_eq!(prepared.report.rejected_count(), 1);
        assert_eq!(prepared.decision.level, ReleaseLevel::Patch);
        assert_eq!(prepared.plan.unwrap().tag, "v1.0.1");
    }

    #[test]
    fn test_prepare_blocks_on_rejected_when_configured() {
        let repo = MockRepository::new();
        repo.add_commit("release", "feat: Add search.");
        repo.add_commit("release", "not conventional");

        let mut config = Config::default();
        config.release.block_on_rejected = true;
        let prepared = prepare_release(&repo, &config, "release", date()).unwrap();
        assert!(!prepared.report.passed());
        assert_eq!(prepared.decision.level, ReleaseLevel::Minor);
        assert!(prepared.plan.is_none());
    }

    #[test]
    fn test_release_requires_checked_out_branch() {
        let repo = MockRepository::new();
        repo.add_commit("release", "fix: Thing.");
        repo.checkout("release-candidate");

        let args = ReleaseArgs {
            branch: Some("release".to_string()),
            dry_run: false,
            push: false,
        };
        let err = run_release(&repo, &Config::default(), &args, date()).unwrap_err();
        assert!(matches!(err, ReleaseGateError::Branch(_)));
    }

    #[test]
    fn test_release_rejects_unknown_branch_before_fetching() {
        let repo = MockRepository::new();
        repo.add_commit("main", "fix: Thing.");
        repo.checkout("main");

        let args = ReleaseArgs {
            branch: None,
            dry_run: true,
            push: true,
        };
        assert!(run_release(&repo, &Config::default(), &args, date()).is_err());
        assert_eq!(repo.fetch_count(), 0);
    }
}
