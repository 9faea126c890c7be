use crate::error::{ReleaseGateError, Result};
use crate::git::CommitInfo;
use git2::{Oid, Repository as Git2Repo};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn head_branch_ref(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        if head.is_branch() {
            head.name().map(str::to_string)
        } else {
            None
        }
    }
}

/// Credentials callback: SSH keys from ~/.ssh, then the SSH agent, then defaults
fn remote_callbacks<'a>() -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseGateError::branch(format!("Cannot read HEAD: {}", e)))?;

        if !head.is_branch() {
            return Err(ReleaseGateError::branch(
                "HEAD is detached; pass --branch explicitly",
            ));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| ReleaseGateError::branch("Branch name is not valid UTF-8"))
    }

    fn get_branch_head_oid(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch_name, git2::BranchType::Local)
            .map_err(|e| {
                ReleaseGateError::branch(format!("Cannot find branch '{}': {}", branch_name, e))
            })?;

        let reference = branch.get();
        let oid = reference.target().ok_or_else(|| {
            ReleaseGateError::branch(format!("Branch '{}' has no target", branch_name))
        })?;

        Ok(oid)
    }

    fn resolve_revision(&self, revision: &str) -> Result<Oid> {
        let commit = self
            .repo
            .revparse_single(revision)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| {
                ReleaseGateError::branch(format!("Cannot resolve '{}': {}", revision, e))
            })?;

        Ok(commit.id())
    }

    fn get_commits_between(&self, from_oid: Option<Oid>, to_oid: Oid) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;

        revwalk.push(to_oid)?;
        if let Some(from_oid) = from_oid {
            revwalk.hide(from_oid)?;
        }

        let mut commits = Vec::new();

        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            let message = commit.message().unwrap_or("").to_string();

            let author = commit.author().name().unwrap_or("unknown").to_string();

            commits.push(CommitInfo {
                hash: oid.to_string(),
                message,
                author,
            });
        }

        commits.reverse();
        Ok(commits)
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let oid = reference
                    .peel(git2::ObjectType::Commit)
                    .map_err(|e| ReleaseGateError::tag(format!("Cannot peel tag: {}", e)))?
                    .id();

                Ok(Some(oid))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(ReleaseGateError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(self.repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn commit_paths(&self, paths: &[String], message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        index.add_all(
            paths.iter().map(String::as_str),
            git2::IndexAddOption::DEFAULT,
            None,
        )?;
        index.write()?;
        let tree_oid = index.write_tree()?;

        let parent = self.repo.head()?.peel_to_commit()?;
        if parent.tree_id() == tree_oid {
            debug!("release assets unchanged, tagging current HEAD");
            return Ok(parent.id());
        }

        let tree = self.repo.find_tree(tree_oid)?;
        let signature = self.repo.signature()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        debug!(%oid, "created release commit");
        Ok(oid)
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| ReleaseGateError::tag(format!("Cannot find object: {}", e)))?;

        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| ReleaseGateError::tag(format!("Cannot create tag: {}", e)))?;

        Ok(())
    }

    fn merge_branch(&self, from: &str, into: &str) -> Result<Oid> {
        let into_ref = format!("refs/heads/{}", into);
        if self.head_branch_ref().as_deref() == Some(into_ref.as_str()) {
            return Err(ReleaseGateError::sync(format!(
                "'{}' is checked out; merge it manually",
                into
            )));
        }

        let from_oid = self.get_branch_head_oid(from)?;
        let into_oid = self.get_branch_head_oid(into)?;

        if super::Repository::is_ancestor(self, from_oid, into_oid)? {
            debug!(from, into, "already up to date");
            return Ok(into_oid);
        }

        let reflog = format!("release-gate: merge {} into {}", from, into);

        if self.repo.graph_descendant_of(from_oid, into_oid)? {
            self.repo
                .reference(&into_ref, from_oid, true, &reflog)
                .map_err(|e| ReleaseGateError::sync(format!("Fast-forward failed: {}", e)))?;
            debug!(from, into, "fast-forwarded");
            return Ok(from_oid);
        }

        let from_commit = self.repo.find_commit(from_oid)?;
        let into_commit = self.repo.find_commit(into_oid)?;
        let mut index = self.repo.merge_commits(&into_commit, &from_commit, None)?;

        if index.has_conflicts() {
            return Err(ReleaseGateError::sync(format!(
                "Merging '{}' into '{}' has conflicts",
                from, into
            )));
        }

        let tree_oid = index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_oid)?;
        let signature = self.repo.signature()?;
        let message = format!("Merge branch '{}' into {}", from, into);

        let oid = self.repo.commit(
            Some(&into_ref),
            &signature,
            &signature,
            &message,
            &tree,
            &[&into_commit, &from_commit],
        )?;

        debug!(from, into, %oid, "created merge commit");
        Ok(oid)
    }

    fn push(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseGateError::remote(format!("Cannot find remote: {}", e)))?;

        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Push rejected for {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();

        remote
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    ReleaseGateError::remote(format!("Network error during push: {}", e))
                } else {
                    ReleaseGateError::remote(format!("Push failed: {}", e))
                }
            })?;

        Ok(())
    }

    fn fetch_from_remote(&self, remote: &str) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseGateError::remote(format!("Cannot find remote: {}", e)))?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks());

        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", remote);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];

        remote_handle
            .fetch(&refspecs, Some(&mut fetch_options), None)
            .map_err(|e| ReleaseGateError::remote(format!("Fetch failed: {}", e)))?;

        Ok(())
    }

    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseGateError::branch("Repository has no working tree"))
    }
}
