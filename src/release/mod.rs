//! Release decision: bump level, release notes and the branch flow that turns
//! them into a publishable plan.

pub mod bump;
pub mod flow;
pub mod notes;

pub use bump::{commit_level, resolve_bump};
pub use flow::{
    execute, ReleaseCollaborator, ReleaseFlow, ReleaseHistory, ReleaseOutcome, ReleasePlan,
    SyncStatus,
};
pub use notes::{compose_notes, NotesSection, ReleaseNotes};

use crate::config::ReleaseConfig;
use crate::domain::{CommitRecord, ReleaseLevel};

/// Bump level and grouped notes for one batch of accepted commits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseDecision {
    pub level: ReleaseLevel,
    pub notes: ReleaseNotes,
}

impl ReleaseDecision {
    /// Whether this decision fires a release at all
    pub fn fires(&self) -> bool {
        self.level.is_release()
    }
}

/// Derive the release decision for a batch of accepted commits
pub fn decide(commits: &[CommitRecord], config: &ReleaseConfig) -> ReleaseDecision {
    ReleaseDecision {
        level: resolve_bump(commits, config),
        notes: compose_notes(commits, config),
    }
}
