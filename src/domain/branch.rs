use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a branch plays in the two-track release topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchRole {
    /// Mainline branch releasing on the default channel
    Release,
    /// Prerelease branch releasing `-<id>.<n>` versions on its own channel
    Prerelease,
}

impl fmt::Display for BranchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchRole::Release => write!(f, "release"),
            BranchRole::Prerelease => write!(f, "prerelease"),
        }
    }
}

/// One-directional merge of `from` into `to` after a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub from: String,
    pub to: String,
}

/// The release branch, the prerelease branch and the backmerge edge between them.
///
/// The only synchronization edge runs from the release branch to the
/// prerelease branch; nothing released from the prerelease branch flows back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTopology {
    #[serde(default = "default_release_branch")]
    pub release: String,

    #[serde(default = "default_prerelease_branch")]
    pub prerelease: String,

    /// Distribution channel of prerelease versions
    #[serde(default = "default_prerelease_channel")]
    pub channel: String,

    /// Identifier used in prerelease versions (`1.3.0-rc.1`)
    #[serde(default = "default_prerelease_id")]
    pub prerelease_id: String,
}

fn default_release_branch() -> String {
    "release".to_string()
}

fn default_prerelease_branch() -> String {
    "release-candidate".to_string()
}

fn default_prerelease_channel() -> String {
    "release-candidate".to_string()
}

fn default_prerelease_id() -> String {
    "rc".to_string()
}

impl Default for BranchTopology {
    fn default() -> Self {
        BranchTopology {
            release: default_release_branch(),
            prerelease: default_prerelease_branch(),
            channel: default_prerelease_channel(),
            prerelease_id: default_prerelease_id(),
        }
    }
}

impl BranchTopology {
    /// Role of `branch`, or `None` when it is not a release branch
    pub fn role_of(&self, branch: &str) -> Option<BranchRole> {
        if branch == self.release {
            Some(BranchRole::Release)
        } else if branch == self.prerelease {
            Some(BranchRole::Prerelease)
        } else {
            None
        }
    }

    /// Channel for releases cut in `role`; `None` is the default channel
    pub fn channel_for(&self, role: BranchRole) -> Option<&str> {
        match role {
            BranchRole::Release => None,
            BranchRole::Prerelease => Some(&self.channel),
        }
    }

    /// Backmerge to perform after a release cut in `role`
    pub fn sync_after(&self, role: BranchRole) -> Option<SyncRequest> {
        match role {
            BranchRole::Release => Some(SyncRequest {
                from: self.release.clone(),
                to: self.prerelease.clone(),
            }),
            BranchRole::Prerelease => None,
        }
    }
}
