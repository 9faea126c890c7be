//! Git operations abstraction layer
//!
//! The release run depends on the [Repository] trait rather than on `git2`
//! directly, so the whole flow can run against [mock::MockRepository] in
//! tests and against [repository::Git2Repository] for real.
//!
//! ```rust
//! # use release_gate::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> release_gate::Result<()> {
//! let head = repo.get_branch_head_oid("release")?;
//! let commits = repo.get_commits_between(None, head)?;
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::PathBuf;

/// Commit information for linting and release decisions
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// The full commit hash
    pub hash: String,
    /// The raw commit message
    pub message: String,
    /// The commit author
    pub author: String,
}

impl CommitInfo {
    pub fn short_hash(&self) -> &str {
        if self.hash.len() > 7 {
            &self.hash[..7]
        } else {
            &self.hash
        }
    }
}

/// Git operations needed by the release run
///
/// All methods return [crate::error::Result<T>]; implementations map
/// underlying errors to the matching [crate::error::ReleaseGateError]
/// variant (`Branch`, `Tag`, `Remote`, `Sync`).
pub trait Repository {
    /// Name of the checked-out branch
    ///
    /// Fails with a branch error when HEAD is detached.
    fn current_branch(&self) -> Result<String>;

    /// Get the OID of a branch's HEAD
    fn get_branch_head_oid(&self, branch_name: &str) -> Result<Oid>;

    /// Resolve a revision expression (`HEAD~3`, a tag, a hash) to a commit
    fn resolve_revision(&self, revision: &str) -> Result<Oid>;

    /// Commits reachable from `to_oid` but not from `from_oid`
    ///
    /// Returned in chronological order (oldest first). With `from_oid` of
    /// `None` the whole history of `to_oid` is returned.
    fn get_commits_between(&self, from_oid: Option<Oid>, to_oid: Oid) -> Result<Vec<CommitInfo>>;

    /// Find a tag by name and get the commit it points to
    ///
    /// Handles both lightweight and annotated tags; `Ok(None)` when missing.
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Get all tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Whether `ancestor` is `descendant` or reachable from it
    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool>;

    /// Stage `paths` (pathspecs) and commit them on the checked-out branch
    ///
    /// Returns the new commit, or the current HEAD when nothing changed.
    fn commit_paths(&self, paths: &[String], message: &str) -> Result<Oid>;

    /// Create a lightweight tag at given OID
    fn create_tag(&self, name: &str, oid: Oid) -> Result<()>;

    /// Merge branch `from` into branch `into`
    ///
    /// Fast-forwards when possible, otherwise records a merge commit. A
    /// conflicting merge fails with a sync error and leaves `into` untouched.
    fn merge_branch(&self, from: &str, into: &str) -> Result<Oid>;

    /// Push refspecs (`refs/heads/x:refs/heads/x`, `refs/tags/t`) to a remote
    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()>;

    /// Fetch branches and tags from a remote
    fn fetch_from_remote(&self, remote: &str) -> Result<()>;

    /// Root of the working tree
    fn workdir(&self) -> Result<PathBuf>;
}

/// Refspec pushing a local branch to the same name on the remote
pub fn branch_refspec(branch: &str) -> String {
    format!("refs/heads/{0}:refs/heads/{0}", branch)
}

/// Refspec pushing a tag to the same name on the remote
pub fn tag_refspec(tag: &str) -> String {
    format!("refs/tags/{0}:refs/tags/{0}", tag)
}
