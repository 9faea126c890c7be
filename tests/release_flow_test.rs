// tests/release_flow_test.rs
use chrono::NaiveDate;
use release_gate::boundary::BoundaryWarning;
use release_gate::cli::orchestration::{run_release, ReleaseArgs};
use release_gate::config::Config;
use release_gate::domain::{BranchRole, ReleaseLevel};
use release_gate::git::{MockRepository, Repository};
use release_gate::release::SyncStatus;
use std::fs;
use tempfile::TempDir;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn release_args(push: bool) -> ReleaseArgs {
    ReleaseArgs {
        branch: None,
        dry_run: false,
        push,
    }
}

/// `release` tagged v1.0.0 with `release-candidate` branched from it
fn released_repo(dir: &TempDir) -> MockRepository {
    let repo = MockRepository::new().with_workdir(dir.path());
    let base = repo.add_commit("release", "feat: Initial import.");
    repo.add_tag("v1.0.0", base);
    repo.create_branch("release-candidate", "release").unwrap();
    repo
}

#[test]
fn test_stable_release_publishes_and_backmerges() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    repo.add_commit("release", "fix: Fix crash on empty input.");
    repo.checkout("release");

    let run = run_release(&repo, &Config::default(), &release_args(true), date()).unwrap();
    let outcome = run.outcome.expect("release should be published");

    assert_eq!(outcome.plan.tag, "v1.0.1");
    assert_eq!(outcome.plan.level, ReleaseLevel::Patch);
    assert_eq!(outcome.plan.channel, None);
    assert_eq!(outcome.sync, SyncStatus::Completed);
    assert!(run.warnings.is_empty());

    assert!(repo.tag_names().contains(&"v1.0.1".to_string()));
    assert_eq!(
        repo.merges(),
        vec![("release".to_string(), "release-candidate".to_string())]
    );
    assert_eq!(
        repo.get_branch_head_oid("release-candidate").unwrap(),
        repo.get_branch_head_oid("release").unwrap()
    );
    assert_eq!(
        repo.pushed(),
        vec![
            "refs/heads/release:refs/heads/release".to_string(),
            "refs/tags/v1.0.1:refs/tags/v1.0.1".to_string(),
            "refs/heads/release-candidate:refs/heads/release-candidate".to_string(),
        ]
    );
    assert_eq!(repo.fetch_count(), 1);

    let committed = repo.committed();
    assert_eq!(committed.len(), 1);
    assert!(committed[0]
        .1
        .starts_with("release: 1.0.1.\n\n## 1.0.1 (2026-10-18)"));

    let changelog = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    assert!(changelog.starts_with("# Changelog\n\n## 1.0.1 (2026-10-18)"));
    assert!(changelog.contains("### :bug: FIX\n\n* Fix crash on empty input.\n"));
}

#[test]
fn test_sync_failure_keeps_the_release() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir).with_merge_conflict();
    repo.add_commit("release", "feat: Add search.");
    repo.checkout("release");

    let run = run_release(&repo, &Config::default(), &release_args(false), date()).unwrap();
    let outcome = run.outcome.unwrap();

    assert_eq!(outcome.plan.tag, "v1.1.0");
    assert!(matches!(outcome.sync, SyncStatus::Failed { .. }));
    assert!(repo.tag_names().contains(&"v1.1.0".to_string()));
    assert!(run.warnings.iter().any(|w| matches!(
        w,
        BoundaryWarning::SyncFailed { from, to, .. } if from == "release" && to == "release-candidate"
    )));
}

#[test]
fn test_prerelease_iterations_on_candidate_channel() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    repo.checkout("release-candidate");
    let config = Config::default();

    repo.add_commit("release-candidate", "feat: Add search.");
    let first = run_release(&repo, &config, &release_args(false), date())
        .unwrap()
        .outcome
        .unwrap();
    assert_eq!(first.plan.role, BranchRole::Prerelease);
    assert_eq!(first.plan.tag, "v1.1.0-rc.1");
    assert_eq!(first.plan.channel.as_deref(), Some("release-candidate"));
    assert_eq!(first.sync, SyncStatus::NotRequired);

    repo.add_commit("release-candidate", "fix: Handle nulls in search.");
    let second = run_release(&repo, &config, &release_args(false), date())
        .unwrap()
        .outcome
        .unwrap();
    assert_eq!(second.plan.tag, "v1.1.0-rc.2");
    assert_eq!(second.plan.previous.unwrap().to_string(), "1.1.0-rc.1");

    assert!(repo.merges().is_empty());
    assert!(!repo.tag_names().iter().any(|t| t == "v1.1.0"));
}

#[test]
fn test_prerelease_after_backmerged_stable_release() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    let config = Config::default();

    repo.add_commit("release-candidate", "feat: Add search.");
    repo.checkout("release-candidate");
    run_release(&repo, &config, &release_args(false), date()).unwrap();

    repo.add_commit("release", "feat: Add export.");
    repo.checkout("release");
    let stable = run_release(&repo, &config, &release_args(false), date())
        .unwrap()
        .outcome
        .unwrap();
    assert_eq!(stable.plan.tag, "v1.1.0");
    assert_eq!(stable.sync, SyncStatus::Completed);

    repo.add_commit("release-candidate", "fix: Handle nulls in search.");
    repo.checkout("release-candidate");
    let next = run_release(&repo, &config, &release_args(false), date())
        .unwrap()
        .outcome
        .unwrap();
    // the search feature never shipped in 1.1.0, so the next candidate is a minor
    assert_eq!(next.plan.previous.unwrap().to_string(), "1.1.0");
    assert_eq!(next.plan.tag, "v1.2.0-rc.1");
}

#[test]
fn test_no_release_worthy_commits() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    repo.add_commit("release", "chore: Bump dependency.");
    repo.add_commit("release", "doc: Explain flags.");
    repo.checkout("release");

    let run = run_release(&repo, &Config::default(), &release_args(false), date()).unwrap();
    assert!(run.outcome.is_none());
    assert!(run.prepared.plan.is_none());
    assert_eq!(run.prepared.decision.level, ReleaseLevel::None);
    assert!(!run.rejected());
    assert_eq!(repo.tag_names(), vec!["v1.0.0".to_string()]);
    assert!(repo.committed().is_empty());
    assert!(!dir.path().join("CHANGELOG.md").exists());
}

#[test]
fn test_no_new_commits_warns() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    repo.checkout("release");

    let run = run_release(&repo, &Config::default(), &release_args(false), date()).unwrap();
    assert!(run.outcome.is_none());
    assert!(matches!(
        run.warnings.as_slice(),
        [BoundaryWarning::NoNewCommits { last_tag: Some(tag), .. }] if tag == "v1.0.0"
    ));
}

#[test]
fn test_rejected_commits_are_left_out_of_the_release() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    repo.add_commit("release", "fix: Fix crash on empty input.");
    repo.add_commit("release", "oops typo");
    repo.checkout("release");

    let run = run_release(&repo, &Config::default(), &release_args(false), date()).unwrap();
    assert!(run.rejected());
    assert!(run
        .warnings
        .contains(&BoundaryWarning::RejectedCommits { count: 1 }));

    let outcome = run.outcome.unwrap();
    assert_eq!(outcome.plan.tag, "v1.0.1");
    assert_eq!(outcome.plan.level, ReleaseLevel::Patch);
    assert!(!outcome.plan.changelog.contains("oops typo"));
}

#[test]
fn test_rejected_commits_block_release_when_configured() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    repo.add_commit("release", "feat: Add search.");
    repo.add_commit("release", "fix(lib/unknown_scope): Patch thing.");
    repo.checkout("release");

    let mut config = Config::default();
    config.release.block_on_rejected = true;

    let run = run_release(&repo, &config, &release_args(false), date()).unwrap();
    assert!(run.rejected());
    assert!(run.outcome.is_none());
    assert!(run
        .warnings
        .contains(&BoundaryWarning::RejectedCommits { count: 1 }));
    assert_eq!(repo.tag_names(), vec!["v1.0.0".to_string()]);
}

#[test]
fn test_dry_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir);
    repo.add_commit("release", "feat!: Change API shape.");
    repo.checkout("release-candidate");

    let args = ReleaseArgs {
        branch: Some("release".to_string()),
        dry_run: true,
        push: false,
    };
    let run = run_release(&repo, &Config::default(), &args, date()).unwrap();

    let plan = run.prepared.plan.as_ref().unwrap();
    assert_eq!(plan.tag, "v2.0.0");
    assert!(run.outcome.is_none());
    assert_eq!(repo.tag_names(), vec!["v1.0.0".to_string()]);
    assert!(repo.merges().is_empty());
    assert_eq!(repo.fetch_count(), 0);
}

#[test]
fn test_first_release_uses_initial_version() {
    let dir = TempDir::new().unwrap();
    let repo = MockRepository::new().with_workdir(dir.path());
    repo.add_commit("release", "feat: Initial import.");
    repo.create_branch("release-candidate", "release").unwrap();
    repo.checkout("release");

    let outcome = run_release(&repo, &Config::default(), &release_args(false), date())
        .unwrap()
        .outcome
        .unwrap();
    assert_eq!(outcome.plan.tag, "v1.0.0");
    assert_eq!(outcome.plan.previous, None);
}

#[test]
fn test_push_failure_is_an_error_and_skips_sync() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir).with_push_failure();
    repo.add_commit("release", "fix: Fix crash on empty input.");
    repo.checkout("release");

    assert!(run_release(&repo, &Config::default(), &release_args(true), date()).is_err());
    assert!(repo.merges().is_empty());
}

#[test]
fn test_fetch_failure_is_only_a_warning() {
    let dir = TempDir::new().unwrap();
    let repo = released_repo(&dir).with_fetch_failure();
    repo.add_commit("release", "fix: Fix crash on empty input.");
    repo.checkout("release");

    let run = run_release(&repo, &Config::default(), &release_args(true), date()).unwrap();
    assert!(run.outcome.is_some());
    assert!(matches!(
        run.warnings.first(),
        Some(BoundaryWarning::FetchFailed { remote, .. }) if remote == "origin"
    ));
}

#[cfg(unix)]
mod hooks {
    use super::*;

    #[test]
    fn test_failing_verify_conditions_aborts_before_changes() {
        let dir = TempDir::new().unwrap();
        let repo = released_repo(&dir);
        repo.add_commit("release", "fix: Fix crash on empty input.");
        repo.checkout("release");

        let mut config = Config::default();
        config.hooks.verify_conditions = Some("exit 1".to_string());

        assert!(run_release(&repo, &config, &release_args(false), date()).is_err());
        assert_eq!(repo.tag_names(), vec!["v1.0.0".to_string()]);
        assert!(!dir.path().join("CHANGELOG.md").exists());
    }

    #[test]
    fn test_prepare_and_publish_hooks_see_the_version() {
        let dir = TempDir::new().unwrap();
        let repo = released_repo(&dir);
        repo.add_commit("release-candidate", "feat: Add search.");
        repo.checkout("release-candidate");

        let mut config = Config::default();
        config.hooks.prepare = Some("echo {version} > VERSION".to_string());
        config.hooks.publish = Some("echo $RELEASE_GATE_CHANNEL > CHANNEL".to_string());

        run_release(&repo, &config, &release_args(false), date()).unwrap();

        let version = fs::read_to_string(dir.path().join("VERSION")).unwrap();
        assert_eq!(version.trim(), "1.1.0-rc.1");
        let channel = fs::read_to_string(dir.path().join("CHANNEL")).unwrap();
        assert_eq!(channel.trim(), "release-candidate");
    }
}
