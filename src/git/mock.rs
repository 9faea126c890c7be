use crate::error::{ReleaseGateError, Result};
use crate::git::{CommitInfo, Repository};
use git2::Oid;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone)]
struct MockCommit {
    seq: u64,
    info: CommitInfo,
    parents: Vec<Oid>,
}

/// In-memory repository for testing the release run without git
///
/// Keeps a small commit graph, branch heads and tags, and records every
/// mutating call so tests can assert on them.
pub struct MockRepository {
    current: RefCell<Option<String>>,
    commits: RefCell<HashMap<Oid, MockCommit>>,
    branch_heads: RefCell<HashMap<String, Oid>>,
    tags: RefCell<BTreeMap<String, Oid>>,
    pushed: RefCell<Vec<String>>,
    merges: RefCell<Vec<(String, String)>>,
    committed: RefCell<Vec<(Vec<String>, String)>>,
    fetches: Cell<usize>,
    next_seq: Cell<u64>,
    workdir: Option<PathBuf>,
    fail_merge: bool,
    fail_push: bool,
    fail_fetch: bool,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            current: RefCell::new(None),
            commits: RefCell::new(HashMap::new()),
            branch_heads: RefCell::new(HashMap::new()),
            tags: RefCell::new(BTreeMap::new()),
            pushed: RefCell::new(Vec::new()),
            merges: RefCell::new(Vec::new()),
            committed: RefCell::new(Vec::new()),
            fetches: Cell::new(0),
            next_seq: Cell::new(1),
            workdir: None,
            fail_merge: false,
            fail_push: false,
            fail_fetch: false,
        }
    }

    /// Directory returned by [`Repository::workdir`]
    pub fn with_workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.workdir = Some(path.into());
        self
    }

    /// Make every merge fail as if it had conflicts
    pub fn with_merge_conflict(mut self) -> Self {
        self.fail_merge = true;
        self
    }

    pub fn with_push_failure(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn with_fetch_failure(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Set the checked-out branch
    pub fn checkout(&self, branch: impl Into<String>) {
        *self.current.borrow_mut() = Some(branch.into());
    }

    fn next_oid(&self) -> (u64, Oid) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&seq.to_be_bytes());
        (seq, Oid::from_bytes(&bytes).unwrap_or_else(|_| Oid::zero()))
    }

    fn insert_commit(&self, message: &str, parents: Vec<Oid>) -> Oid {
        let (seq, oid) = self.next_oid();
        self.commits.borrow_mut().insert(
            oid,
            MockCommit {
                seq,
                info: CommitInfo {
                    hash: oid.to_string(),
                    message: message.to_string(),
                    author: "Mock Author".to_string(),
                },
                parents,
            },
        );
        oid
    }

    /// Add a commit on top of `branch`, creating the branch when missing
    pub fn add_commit(&self, branch: &str, message: &str) -> Oid {
        let parent = self.branch_heads.borrow().get(branch).copied();
        let oid = self.insert_commit(message, parent.into_iter().collect());
        self.branch_heads
            .borrow_mut()
            .insert(branch.to_string(), oid);
        oid
    }

    /// Create `branch` pointing at the head of `from`
    pub fn create_branch(&self, branch: &str, from: &str) -> Result<Oid> {
        let oid = self.get_branch_head_oid(from)?;
        self.branch_heads
            .borrow_mut()
            .insert(branch.to_string(), oid);
        Ok(oid)
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&self, name: impl Into<String>, oid: Oid) {
        self.tags.borrow_mut().insert(name.into(), oid);
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.tags.borrow().keys().cloned().collect()
    }

    /// Refspecs pushed so far, in order
    pub fn pushed(&self) -> Vec<String> {
        self.pushed.borrow().clone()
    }

    /// `(from, into)` pairs merged so far
    pub fn merges(&self) -> Vec<(String, String)> {
        self.merges.borrow().clone()
    }

    /// `(paths, message)` of every release commit
    pub fn committed(&self) -> Vec<(Vec<String>, String)> {
        self.committed.borrow().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    fn ancestors(&self, oid: Oid) -> HashSet<Oid> {
        let commits = self.commits.borrow();
        let mut seen = HashSet::new();
        let mut stack = vec![oid];
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            if let Some(commit) = commits.get(&next) {
                stack.extend(commit.parents.iter().copied());
            }
        }
        seen
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn current_branch(&self) -> Result<String> {
        self.current
            .borrow()
            .clone()
            .ok_or_else(|| ReleaseGateError::branch("HEAD is detached"))
    }

    fn get_branch_head_oid(&self, branch_name: &str) -> Result<Oid> {
        self.branch_heads
            .borrow()
            .get(branch_name)
            .copied()
            .ok_or_else(|| ReleaseGateError::branch(format!("Branch not found: {}", branch_name)))
    }

    fn resolve_revision(&self, revision: &str) -> Result<Oid> {
        if let Ok(oid) = self.get_branch_head_oid(revision) {
            return Ok(oid);
        }
        if let Some(oid) = self.tags.borrow().get(revision) {
            return Ok(*oid);
        }
        Oid::from_str(revision)
            .ok()
            .filter(|oid| self.commits.borrow().contains_key(oid))
            .ok_or_else(|| ReleaseGateError::branch(format!("Cannot resolve '{}'", revision)))
    }

    fn get_commits_between(&self, from_oid: Option<Oid>, to_oid: Oid) -> Result<Vec<CommitInfo>> {
        let hidden = from_oid.map(|oid| self.ancestors(oid)).unwrap_or_default();
        let commits = self.commits.borrow();

        let mut range: Vec<&MockCommit> = self
            .ancestors(to_oid)
            .into_iter()
            .filter(|oid| !hidden.contains(oid))
            .filter_map(|oid| commits.get(&oid))
            .collect();
        range.sort_by_key(|c| c.seq);

        Ok(range.into_iter().map(|c| c.info.clone()).collect())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        Ok(self.tags.borrow().get(tag_name).copied())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.tag_names())
    }

    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool> {
        Ok(self.ancestors(descendant).contains(&ancestor))
    }

    fn commit_paths(&self, paths: &[String], message: &str) -> Result<Oid> {
        let branch = self.current_branch()?;
        let oid = self.add_commit(&branch, message);
        self.committed
            .borrow_mut()
            .push((paths.to_vec(), message.to_string()));
        Ok(oid)
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        if self.tags.borrow().contains_key(name) {
            return Err(ReleaseGateError::tag(format!("Tag '{}' already exists", name)));
        }
        self.add_tag(name, oid);
        Ok(())
    }

    fn merge_branch(&self, from: &str, into: &str) -> Result<Oid> {
        if self.fail_merge {
            return Err(ReleaseGateError::sync(format!(
                "Merging '{}' into '{}' has conflicts",
                from, into
            )));
        }

        let from_oid = self.get_branch_head_oid(from)?;
        let into_oid = self.get_branch_head_oid(into)?;
        self.merges
            .borrow_mut()
            .push((from.to_string(), into.to_string()));

        if self.is_ancestor(from_oid, into_oid)? {
            return Ok(into_oid);
        }

        let head = if self.is_ancestor(into_oid, from_oid)? {
            from_oid
        } else {
            self.insert_commit(
                &format!("Merge branch '{}' into {}", from, into),
                vec![into_oid, from_oid],
            )
        };
        self.branch_heads.borrow_mut().insert(into.to_string(), head);
        Ok(head)
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseGateError::remote(format!(
                "Push to '{}' rejected",
                remote
            )));
        }
        self.pushed.borrow_mut().extend(refspecs.iter().cloned());
        Ok(())
    }

    fn fetch_from_remote(&self, remote: &str) -> Result<()> {
        self.fetches.set(self.fetches.get() + 1);
        if self.fail_fetch {
            return Err(ReleaseGateError::remote(format!(
                "Cannot reach remote '{}'",
                remote
            )));
        }
        Ok(())
    }

    fn workdir(&self) -> Result<PathBuf> {
        self.workdir
            .clone()
            .ok_or_else(|| ReleaseGateError::branch("Mock repository has no working tree"))
    }
}
