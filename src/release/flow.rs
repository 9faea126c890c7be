//! Release flow controller
//!
//! Decides, for the branch a release is cut from, which version and tag the
//! release gets, which channel it goes to, and which backmerge must follow.
//! Executing a plan is delegated to a [`ReleaseCollaborator`] so the flow
//! itself never touches git or the network.

use crate::changelog;
use crate::config::ReleaseConfig;
use crate::domain::{
    BranchRole, PreRelease, ReleaseLevel, SyncRequest, TagPattern, Version,
};
use crate::error::{ReleaseGateError, Result};
use crate::release::{ReleaseDecision, ReleaseNotes};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Latest releases reachable from the branch being released
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseHistory {
    pub latest_stable: Option<Version>,
    pub latest_prerelease: Option<Version>,
}

impl ReleaseHistory {
    /// Collect history from tag names.
    ///
    /// Tags that do not follow `pattern`, and pre-releases with another
    /// identifier, are ignored.
    pub fn from_tags<I, S>(tags: I, pattern: &TagPattern, prerelease_id: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut history = ReleaseHistory::default();
        for tag in tags {
            let Some(version) = pattern.parse(tag.as_ref()) else {
                continue;
            };
            let slot = match &version.pre {
                None => &mut history.latest_stable,
                Some(pre) if pre.identifier == prerelease_id => &mut history.latest_prerelease,
                Some(_) => continue,
            };
            if slot.as_ref().map_or(true, |current| version > *current) {
                *slot = Some(version);
            }
        }
        history
    }

    /// The release the next one is measured against on a branch with `role`
    pub fn last_release(&self, role: BranchRole) -> Option<&Version> {
        match role {
            BranchRole::Release => self.latest_stable.as_ref(),
            BranchRole::Prerelease => {
                match (&self.latest_stable, &self.latest_prerelease) {
                    (Some(stable), Some(pre)) => Some(if pre > stable { pre } else { stable }),
                    (stable, pre) => stable.as_ref().or(pre.as_ref()),
                }
            }
        }
    }
}

/// Everything needed to publish one release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub role: BranchRole,
    pub branch: String,
    /// `None` for the default (stable) channel
    pub channel: Option<String>,
    pub previous: Option<Version>,
    pub version: Version,
    pub tag: String,
    pub level: ReleaseLevel,
    pub notes: ReleaseNotes,
    /// Rendered changelog fragment
    pub changelog: String,
    /// Release commit message
    pub message: String,
    pub sync: Option<SyncRequest>,
}

/// Side effects of a release, implemented on top of git and hooks
pub trait ReleaseCollaborator {
    /// Commit, tag and publish the release. Atomic from the flow's view.
    fn publish(&mut self, plan: &ReleasePlan) -> Result<()>;

    /// Merge `request.from` into `request.to`
    fn synchronize(&mut self, request: &SyncRequest) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    NotRequired,
    Completed,
    /// Published but not synchronized; needs a manual backmerge
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub plan: ReleasePlan,
    pub sync: SyncStatus,
}

impl ReleaseOutcome {
    pub fn is_fully_synced(&self) -> bool {
        !matches!(self.sync, SyncStatus::Failed { .. })
    }
}

pub struct ReleaseFlow<'a> {
    config: &'a ReleaseConfig,
    pattern: TagPattern,
}

impl<'a> ReleaseFlow<'a> {
    pub fn new(config: &'a ReleaseConfig) -> Result<Self> {
        Ok(ReleaseFlow {
            config,
            pattern: config.tag_pattern()?,
        })
    }

    pub fn tag_pattern(&self) -> &TagPattern {
        &self.pattern
    }

    /// Role of `branch`, or a branch error when it is not a release branch
    pub fn role_of(&self, branch: &str) -> Result<BranchRole> {
        self.config.branches.role_of(branch).ok_or_else(|| {
            ReleaseGateError::branch(format!(
                "'{}' is not a release branch (expected '{}' or '{}')",
                branch, self.config.branches.release, self.config.branches.prerelease
            ))
        })
    }

    /// Plan the release of `branch`.
    ///
    /// Returns `Ok(None)` when the decision does not fire a release.
    pub fn plan(
        &self,
        branch: &str,
        decision: &ReleaseDecision,
        history: &ReleaseHistory,
        date: NaiveDate,
    ) -> Result<Option<ReleasePlan>> {
        let role = self.role_of(branch)?;

        if !decision.fires() {
            info!(branch, "no release-worthy commits, nothing to release");
            return Ok(None);
        }

        let version = self.next_version(role, decision.level, history)?;
        let previous = history.last_release(role).cloned();
        if let Some(previous) = &previous {
            if version <= *previous {
                return Err(ReleaseGateError::version(format!(
                    "Next version {} is not above the last release {}",
                    version, previous
                )));
            }
        }

        let fragment = changelog::render(&decision.notes, &version, date);
        let plan = ReleasePlan {
            role,
            branch: branch.to_string(),
            channel: self.config.branches.channel_for(role).map(str::to_string),
            previous,
            tag: self.pattern.format(&version),
            level: decision.level,
            notes: decision.notes.clone(),
            message: self.config.render_message(&version, &fragment),
            changelog: fragment,
            sync: self.config.branches.sync_after(role),
            version,
        };

        info!(
            branch,
            %role,
            version = %plan.version,
            level = %plan.level,
            "planned release"
        );
        Ok(Some(plan))
    }

    fn next_version(
        &self,
        role: BranchRole,
        level: ReleaseLevel,
        history: &ReleaseHistory,
    ) -> Result<Version> {
        let stable_target = match &history.latest_stable {
            Some(stable) => stable.bump(level),
            None => self.config.initial_version()?,
        };

        match role {
            BranchRole::Release => Ok(stable_target),
            BranchRole::Prerelease => {
                let id = &self.config.branches.prerelease_id;
                let next = match &history.latest_prerelease {
                    Some(current) if current.base() >= stable_target => {
                        let pre = current
                            .pre
                            .as_ref()
                            .map(PreRelease::increment_iteration)
                            .unwrap_or_else(|| PreRelease::first(id.as_str()));
                        current.base().with_prerelease(pre)
                    }
                    _ => stable_target.with_prerelease(PreRelease::first(id.as_str())),
                };
                Ok(next)
            }
        }
    }
}

/// Publish a plan, then run its backmerge.
///
/// A publish failure is an error. A backmerge failure after a successful
/// publish is reported in the outcome; the release itself stands.
pub fn execute<C: ReleaseCollaborator>(plan: ReleasePlan, collaborator: &mut C) -> Result<ReleaseOutcome> {
    collaborator.publish(&plan)?;
    info!(tag = %plan.tag, "published release");

    let sync = match &plan.sync {
        None => SyncStatus::NotRequired,
        Some(request) => match collaborator.synchronize(request) {
            Ok(()) => {
                info!(from = %request.from, to = %request.to, "synchronized branches");
                SyncStatus::Completed
            }
            Err(e) => {
                warn!(
                    from = %request.from,
                    to = %request.to,
                    error = %e,
                    "release published but branch synchronization failed"
                );
                SyncStatus::Failed {
                    reason: e.to_string(),
                }
            }
        },
    };

    Ok(ReleaseOutcome { plan, sync })
}
