//! In-memory backend.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::Utc;

use super::{Backend, BackendError, CheckoutRequest, CommitId, CommitInfo};
use crate::core::identity::Identity;

/// Refs and commits held in memory, with no worktree.
///
/// HEAD starts on an unborn `main`. Listing failures can be injected with
/// [`MemoryBackend::set_fail_listing`].
#[derive(Debug)]
pub struct MemoryBackend {
    refs: BTreeMap<String, CommitId>,
    head: Option<String>,
    commits: HashMap<CommitId, CommitInfo>,
    staged: Vec<String>,
    next_id: u64,
    fail_listing: bool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            refs: BTreeMap::new(),
            head: Some(super::branch_ref("main")),
            commits: HashMap::new(),
            staged: Vec::new(),
            next_id: 1,
            fail_listing: false,
        }
    }

    /// Make every `list_refs` call fail.
    pub fn set_fail_listing(&mut self, fail: bool) {
        self.fail_listing = fail;
    }

    /// Paths staged since the last commit.
    pub fn staged(&self) -> &[String] {
        &self.staged
    }

    fn new_commit(&mut self, parents: Vec<CommitId>, author: &Identity, message: &str) -> CommitId {
        let id = CommitId::new(format!("{:040x}", self.next_id));
        self.next_id += 1;
        self.commits.insert(
            id.clone(),
            CommitInfo {
                id: id.clone(),
                parents,
                author_name: author.name().to_string(),
                author_email: author.email().to_string(),
                message: message.to_string(),
                time: Utc::now(),
            },
        );
        id
    }

    fn head_commit(&self) -> Option<CommitId> {
        self.head.as_ref().and_then(|head| self.refs.get(head).cloned())
    }
}

impl Backend for MemoryBackend {
    fn workdir(&self) -> Option<&Path> {
        None
    }

    fn resolve_ref(&self, refname: &str) -> Result<Option<CommitId>, BackendError> {
        Ok(self.refs.get(refname).cloned())
    }

    fn write_ref(&mut self, refname: &str, target: &CommitId, force: bool) -> Result<(), BackendError> {
        if !self.commits.contains_key(target) {
            return Err(BackendError::new(format!("unknown commit {}", target)));
        }
        if !force && self.refs.contains_key(refname) {
            return Err(BackendError::new(format!("{} already exists", refname)));
        }
        self.refs.insert(refname.to_string(), target.clone());
        Ok(())
    }

    fn delete_ref(&mut self, refname: &str) -> Result<(), BackendError> {
        self.refs
            .remove(refname)
            .map(|_| ())
            .ok_or_else(|| BackendError::new(format!("{} not found", refname)))
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        if self.fail_listing {
            return Err(BackendError::new("listing refs failed"));
        }
        Ok(self
            .refs
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn head_branch(&self) -> Result<Option<String>, BackendError> {
        Ok(self.head.clone())
    }

    fn checkout(&mut self, request: &CheckoutRequest<'_>) -> Result<(), BackendError> {
        let existing = self.refs.get(request.branch).cloned();
        if request.create && existing.is_some() {
            return Err(BackendError::new(format!("{} already exists", request.branch)));
        }

        let target = match (request.target, request.create) {
            (Some(target), _) => target.clone(),
            (None, true) => self
                .head_commit()
                .ok_or_else(|| BackendError::new("HEAD has no commit to branch from"))?,
            (None, false) => existing.ok_or_else(|| BackendError::new(format!("{} not found", request.branch)))?,
        };
        if !self.commits.contains_key(&target) {
            return Err(BackendError::new(format!("unknown commit {}", target)));
        }

        self.refs.insert(request.branch.to_string(), target);
        self.head = Some(request.branch.to_string());
        Ok(())
    }

    fn stage_path(&mut self, path: &str) -> Result<(), BackendError> {
        self.staged.push(path.to_string());
        Ok(())
    }

    fn commit(&mut self, author: &Identity, message: &str) -> Result<CommitId, BackendError> {
        let head = self
            .head
            .clone()
            .ok_or_else(|| BackendError::new("HEAD is detached"))?;
        let parents = self.head_commit().into_iter().collect();

        let id = self.new_commit(parents, author, message);
        self.refs.insert(head, id.clone());
        self.staged.clear();
        Ok(id)
    }

    fn commit_root(&mut self, refname: &str, author: &Identity, message: &str) -> Result<CommitId, BackendError> {
        if self.refs.contains_key(refname) {
            return Err(BackendError::new(format!("{} already exists", refname)));
        }
        let id = self.new_commit(Vec::new(), author, message);
        self.refs.insert(refname.to_string(), id.clone());
        Ok(id)
    }

    fn commit_info(&self, id: &CommitId) -> Result<CommitInfo, BackendError> {
        self.commits
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::new(format!("commit {} not found", id)))
    }
}
