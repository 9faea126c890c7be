use std::fmt;

/// Non-fatal conditions met while preparing or running a release.
/// These are reported to the user but never abort the run by themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No new commits since the last release tag
    NoNewCommits {
        last_tag: Option<String>,
        current_commit_hash: String,
    },
    /// Some commits in the range do not follow the commit convention
    RejectedCommits { count: usize },
    /// Fetch failed; local branch and tag data is used instead
    FetchFailed { remote: String, reason: String },
    /// The release was published but the backmerge did not happen
    SyncFailed {
        from: String,
        to: String,
        reason: String,
    },
}

impl BoundaryWarning {
    /// Command the user should run to resolve the warning, if any
    pub fn follow_up(&self) -> Option<String> {
        match self {
            BoundaryWarning::SyncFailed { from, to, .. } => Some(format!(
                "git checkout {} && git merge {} && git push",
                to, from
            )),
            _ => None,
        }
    }
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoNewCommits {
                last_tag,
                current_commit_hash,
            } => {
                let short_hash = if current_commit_hash.len() > 7 {
                    &current_commit_hash[..7]
                } else {
                    current_commit_hash.as_str()
                };
                match last_tag {
                    Some(tag) => write!(
                        f,
                        "No new commits since tag '{}' (current: {})",
                        tag, short_hash
                    ),
                    None => write!(f, "No commits found (current: {})", short_hash),
                }
            }
            BoundaryWarning::RejectedCommits { count } => {
                write!(
                    f,
                    "{} commit(s) do not follow the commit convention and are left out of the release",
                    count
                )
            }
            BoundaryWarning::FetchFailed { remote, reason } => {
                write!(
                    f,
                    "Could not fetch from remote '{}': {}. Using local data",
                    remote, reason
                )
            }
            BoundaryWarning::SyncFailed { from, to, reason } => {
                write!(
                    f,
                    "Release published, but merging '{}' into '{}' failed: {}",
                    from, to, reason
                )
            }
        }
    }
}
