//! Repository state machine.
//!
//! Each secret is a local branch (`refs/heads/<name>`) rooted in its own
//! orphan commit; each frozen version is a lightweight tag
//! (`refs/tags/<name>`). [`Repository`] implements the transitions between
//! those states over a [`Backend`], which supplies the handful of git
//! capabilities the transitions need.
//!
//! Two backends ship with the crate: [`GitBackend`] over libgit2 and
//! [`MemoryBackend`] for tests.

mod git;
mod memory;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::constants;
use crate::core::identity::Identity;
use crate::error::{RepoError, Result};

pub use git::GitBackend;
pub use memory::MemoryBackend;

/// Full ref name of a branch.
pub fn branch_ref(name: &str) -> String {
    format!("{}{}", constants::BRANCH_PREFIX, name)
}

/// Full ref name of a tag.
pub fn tag_ref(name: &str) -> String {
    format!("{}{}", constants::TAG_PREFIX, name)
}

/// Hex object id of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated id for display.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(7);
        &self.0[..end]
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commit metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub id: CommitId,
    pub parents: Vec<CommitId>,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    pub time: DateTime<Utc>,
}

impl CommitInfo {
    /// Whether this commit starts its own history.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

/// What went wrong inside a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// The worktree or index could not be loaded or is not clean.
    Worktree,
    Other,
}

/// Failure reported by a [`Backend`].
///
/// Carries only a message; [`Repository`] maps it to the [`RepoError`]
/// of the transition that failed.
#[derive(Debug, Clone)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Other,
            message: message.into(),
        }
    }

    pub fn worktree(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Worktree,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendError {}

impl From<git2::Error> for BackendError {
    fn from(err: git2::Error) -> Self {
        Self::new(err.message())
    }
}

/// Switch the worktree onto a branch.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRequest<'a> {
    /// Full ref name of the branch.
    pub branch: &'a str,
    /// Commit the branch should point at. `None` keeps the current tip,
    /// or starts from HEAD when creating.
    pub target: Option<&'a CommitId>,
    /// Create the branch; it must not exist yet. Otherwise it must exist.
    pub create: bool,
}

/// Git capabilities required by [`Repository`].
///
/// Ref names are always full (`refs/heads/...`, `refs/tags/...`).
pub trait Backend {
    /// Root of the worktree, if the backend has one.
    fn workdir(&self) -> Option<&Path>;

    /// Commit a ref points at, or `None` if the ref does not exist.
    fn resolve_ref(&self, refname: &str) -> std::result::Result<Option<CommitId>, BackendError>;

    /// Point a ref at a commit. Without `force` an existing ref is an error.
    fn write_ref(&mut self, refname: &str, target: &CommitId, force: bool) -> std::result::Result<(), BackendError>;

    fn delete_ref(&mut self, refname: &str) -> std::result::Result<(), BackendError>;

    /// Full names of all refs starting with `prefix`.
    fn list_refs(&self, prefix: &str) -> std::result::Result<Vec<String>, BackendError>;

    /// Full ref name HEAD points at, even if that branch is unborn.
    /// `None` when HEAD is detached.
    fn head_branch(&self) -> std::result::Result<Option<String>, BackendError>;

    /// Switch the worktree and HEAD onto a branch.
    ///
    /// Refuses to run over uncommitted changes to tracked files. Tracked
    /// files absent from the target tree are removed from the worktree.
    fn checkout(&mut self, request: &CheckoutRequest<'_>) -> std::result::Result<(), BackendError>;

    /// Add a worktree-relative path to the index.
    fn stage_path(&mut self, path: &str) -> std::result::Result<(), BackendError>;

    /// Commit the index plus modifications of tracked files onto HEAD.
    fn commit(&mut self, author: &Identity, message: &str) -> std::result::Result<CommitId, BackendError>;

    /// Write a parentless commit with an empty tree and point `refname` at it.
    fn commit_root(
        &mut self,
        refname: &str,
        author: &Identity,
        message: &str,
    ) -> std::result::Result<CommitId, BackendError>;

    fn commit_info(&self, id: &CommitId) -> std::result::Result<CommitInfo, BackendError>;
}

/// Secret repository.
#[derive(Debug)]
pub struct Repository<B: Backend = GitBackend> {
    backend: B,
}

impl Repository<GitBackend> {
    /// Open the git repository at `path`.
    ///
    /// # Errors
    ///
    /// - `RepoError::RepositoryNotFound` if there is no repository at `path`
    /// - `RepoError::Open` if it cannot be opened or has no worktree
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::with_backend(GitBackend::open(path)?))
    }
}

impl<B: Backend> Repository<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Root of the worktree.
    pub fn workdir(&self) -> Option<&Path> {
        self.backend.workdir()
    }

    /// Create `new` at the tip of `origin` and check it out.
    ///
    /// # Errors
    ///
    /// - `RepoError::OriginNotFound` if `origin` does not exist
    /// - `RepoError::Worktree` if `new` already exists or checkout fails
    pub fn create_branch(&mut self, origin: &str, new: &str) -> Result<()> {
        debug!(origin, branch = new, "creating branch");

        let tip = self
            .resolve(&branch_ref(origin))
            .ok_or_else(|| RepoError::OriginNotFound(origin.to_string()))?;

        if self.branch_exists(new) {
            return Err(RepoError::Worktree {
                op: "create branch",
                message: format!("branch {} already exists", new),
            }
            .into());
        }

        let refname = branch_ref(new);
        self.backend
            .checkout(&CheckoutRequest {
                branch: &refname,
                target: Some(&tip),
                create: true,
            })
            .map_err(|e| worktree("create branch", e))?;
        Ok(())
    }

    /// Create a branch with no history and check it out.
    ///
    /// The branch starts at a parentless commit with an empty tree, so the
    /// worktree is left without any tracked file. If the checkout fails the
    /// new branch is deleted again.
    ///
    /// # Errors
    ///
    /// - `RepoError::Worktree` if the branch exists or checkout fails
    /// - `RepoError::Commit` if the root commit cannot be written
    pub fn create_orphan_branch(&mut self, identity: &Identity, name: &str) -> Result<CommitId> {
        debug!(branch = name, "creating orphan branch");

        if self.branch_exists(name) {
            return Err(RepoError::Worktree {
                op: "create orphan branch",
                message: format!("branch {} already exists", name),
            }
            .into());
        }

        let refname = branch_ref(name);
        let root = self
            .backend
            .commit_root(&refname, identity, &constants::orphan_commit_message(name))
            .map_err(|e| RepoError::Commit(e.message))?;

        let checked_out = self.backend.checkout(&CheckoutRequest {
            branch: &refname,
            target: None,
            create: false,
        });
        if let Err(e) = checked_out {
            if let Err(cleanup) = self.backend.delete_ref(&refname) {
                warn!(branch = name, error = %cleanup.message, "unable to remove orphan branch after failed checkout");
            }
            return Err(worktree("create orphan branch", e).into());
        }

        debug!(branch = name, commit = %root.short(), "orphan branch checked out");
        Ok(root)
    }

    /// Switch the worktree onto an existing branch.
    ///
    /// # Errors
    ///
    /// - `RepoError::BranchNotFound` if the branch does not exist
    /// - `RepoError::Worktree` if checkout fails
    pub fn checkout_branch(&mut self, name: &str) -> Result<()> {
        debug!(branch = name, "checking out branch");

        if !self.branch_exists(name) {
            return Err(RepoError::BranchNotFound(name.to_string()).into());
        }

        let refname = branch_ref(name);
        self.backend
            .checkout(&CheckoutRequest {
                branch: &refname,
                target: None,
                create: false,
            })
            .map_err(|e| worktree("checkout", e))?;
        Ok(())
    }

    /// Tag the tip of `branch` as `tag`, replacing any existing tag.
    ///
    /// # Errors
    ///
    /// - `RepoError::BranchNotFound` if the branch does not exist
    /// - `RepoError::RefWrite` if the tag cannot be written
    pub fn add_tag_branch(&mut self, tag: &str, branch: &str) -> Result<()> {
        debug!(tag, branch, "tagging branch");

        let tip = self
            .resolve(&branch_ref(branch))
            .ok_or_else(|| RepoError::BranchNotFound(branch.to_string()))?;

        let refname = tag_ref(tag);
        self.backend
            .write_ref(&refname, &tip, true)
            .map_err(|e| RepoError::RefWrite {
                refname,
                message: e.message,
            })?;
        Ok(())
    }

    /// Put branch `name` at the commit of tag `name` and check it out.
    ///
    /// With `create` the branch must not exist yet; otherwise it must exist
    /// and is reset to the tagged commit.
    ///
    /// # Errors
    ///
    /// - `RepoError::TagNotFound` if the tag does not exist
    /// - `RepoError::BranchNotFound` if `create` is false and the branch is missing
    /// - `RepoError::Worktree` if `create` is true and the branch exists, or checkout fails
    pub fn tag_branch(&mut self, name: &str, create: bool) -> Result<()> {
        debug!(tag = name, create, "restoring branch from tag");

        let target = self
            .resolve(&tag_ref(name))
            .ok_or_else(|| RepoError::TagNotFound(name.to_string()))?;

        let exists = self.branch_exists(name);
        if create && exists {
            return Err(RepoError::Worktree {
                op: "tag branch",
                message: format!("branch {} already exists", name),
            }
            .into());
        }
        if !create && !exists {
            return Err(RepoError::BranchNotFound(name.to_string()).into());
        }

        let refname = branch_ref(name);
        self.backend
            .checkout(&CheckoutRequest {
                branch: &refname,
                target: Some(&target),
                create,
            })
            .map_err(|e| worktree("tag branch", e))?;
        Ok(())
    }

    /// Stage `filename` and commit it with any tracked modifications.
    ///
    /// # Errors
    ///
    /// - `RepoError::Worktree` if the worktree or index cannot be loaded
    /// - `RepoError::Add` if the file cannot be staged
    /// - `RepoError::Commit` if the commit cannot be written
    pub fn commit_file(&mut self, identity: &Identity, filename: &str, message: &str) -> Result<CommitId> {
        debug!(file = filename, "committing file");

        self.backend.stage_path(filename).map_err(|e| match e.kind {
            BackendErrorKind::Worktree => RepoError::Worktree {
                op: "commit file",
                message: e.message,
            },
            BackendErrorKind::Other => RepoError::Add {
                path: filename.to_string(),
                message: e.message,
            },
        })?;

        self.commit(identity, message)
    }

    /// Commit every modification of tracked files (`commit -a`).
    ///
    /// # Errors
    ///
    /// - `RepoError::Worktree` if the worktree or index cannot be loaded
    /// - `RepoError::Commit` if the commit cannot be written
    pub fn commit(&mut self, identity: &Identity, message: &str) -> Result<CommitId> {
        let id = self.backend.commit(identity, message).map_err(|e| match e.kind {
            BackendErrorKind::Worktree => RepoError::Worktree {
                op: "commit",
                message: e.message,
            },
            BackendErrorKind::Other => RepoError::Commit(e.message),
        })?;

        debug!(commit = %id.short(), "committed");
        Ok(id)
    }

    /// Short names of all local branches, sorted.
    ///
    /// Best-effort: a failure to enumerate refs yields an empty list.
    pub fn list_branches(&self) -> Vec<String> {
        match self.backend.list_refs(constants::BRANCH_PREFIX) {
            Ok(refs) => {
                let mut names: Vec<String> = refs
                    .iter()
                    .filter_map(|r| r.strip_prefix(constants::BRANCH_PREFIX))
                    .map(str::to_string)
                    .collect();
                names.sort();
                names
            }
            Err(e) => {
                warn!(error = %e, "unable to list branches");
                Vec::new()
            }
        }
    }

    /// Whether branch `name` exists. `false` if refs cannot be read.
    pub fn branch_exists(&self, name: &str) -> bool {
        self.ref_listed(constants::BRANCH_PREFIX, &branch_ref(name))
    }

    /// Whether tag `name` exists. `false` if refs cannot be read.
    pub fn tag_exists(&self, name: &str) -> bool {
        self.ref_listed(constants::TAG_PREFIX, &tag_ref(name))
    }

    /// Delete branch `name`. Tags on its commits are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::RefDelete` if the branch does not exist, is
    /// checked out, or cannot be deleted.
    pub fn remove_branch(&mut self, name: &str) -> Result<()> {
        debug!(branch = name, "removing branch");

        let refname = branch_ref(name);
        let refuse = |message: String| RepoError::RefDelete {
            refname: refname.clone(),
            message,
        };

        if !self.branch_exists(name) {
            return Err(refuse("branch does not exist".to_string()).into());
        }
        if self.current_branch().as_deref() == Some(name) {
            return Err(refuse("cannot delete the checked out branch".to_string()).into());
        }

        self.backend
            .delete_ref(&refname)
            .map_err(|e| refuse(e.message))?;
        Ok(())
    }

    /// Short name of the checked-out branch, if HEAD is on one.
    pub fn current_branch(&self) -> Option<String> {
        match self.backend.head_branch() {
            Ok(head) => head.and_then(|r| r.strip_prefix(constants::BRANCH_PREFIX).map(str::to_string)),
            Err(e) => {
                warn!(error = %e, "unable to read HEAD");
                None
            }
        }
    }

    /// Commit at the tip of branch `name`.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::BranchNotFound` if the branch does not exist.
    pub fn branch_tip(&self, name: &str) -> Result<CommitId> {
        self.resolve(&branch_ref(name))
            .ok_or_else(|| RepoError::BranchNotFound(name.to_string()).into())
    }

    /// Commit at tag `name`.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::TagNotFound` if the tag does not exist.
    pub fn tag_target(&self, name: &str) -> Result<CommitId> {
        self.resolve(&tag_ref(name))
            .ok_or_else(|| RepoError::TagNotFound(name.to_string()).into())
    }

    /// Read commit metadata.
    ///
    /// # Errors
    ///
    /// Returns `RepoError::ReadCommit` if the commit cannot be read.
    pub fn commit_info(&self, id: &CommitId) -> Result<CommitInfo> {
        self.backend.commit_info(id).map_err(|e| {
            RepoError::ReadCommit {
                id: id.to_string(),
                message: e.message,
            }
            .into()
        })
    }

    /// Path of a worktree file.
    pub fn worktree_path(&self, filename: &str) -> Result<PathBuf> {
        self.workdir()
            .map(|dir| dir.join(filename))
            .ok_or_else(|| {
                RepoError::Worktree {
                    op: "worktree path",
                    message: "repository has no worktree".to_string(),
                }
                .into()
            })
    }

    fn resolve(&self, refname: &str) -> Option<CommitId> {
        match self.backend.resolve_ref(refname) {
            Ok(id) => id,
            Err(e) => {
                warn!(refname, error = %e, "unable to resolve ref");
                None
            }
        }
    }

    fn ref_listed(&self, prefix: &str, refname: &str) -> bool {
        match self.backend.list_refs(prefix) {
            Ok(refs) => refs.iter().any(|r| r == refname),
            Err(e) => {
                warn!(refname, error = %e, "unable to list refs");
                false
            }
        }
    }
}

fn worktree(op: &'static str, err: BackendError) -> RepoError {
    RepoError::Worktree {
        op,
        message: err.message,
    }
}
