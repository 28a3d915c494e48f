//! libgit2 backend.

use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{ErrorCode, Oid, Signature, StatusOptions};
use tracing::{debug, trace};

use super::{Backend, BackendError, CheckoutRequest, CommitId, CommitInfo};
use crate::core::identity::Identity;
use crate::error::{RepoError, Result};

/// A non-bare git repository on disk.
pub struct GitBackend {
    repo: git2::Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for GitBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitBackend")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

impl GitBackend {
    /// Open the repository rooted at `path`.
    ///
    /// # Errors
    ///
    /// - `RepoError::RepositoryNotFound` if `path` holds no repository
    /// - `RepoError::Open` if it cannot be opened or is bare
    pub fn open(path: &Path) -> Result<Self> {
        let repo = git2::Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => RepoError::RepositoryNotFound(path.to_path_buf()),
            _ => RepoError::Open {
                path: path.to_path_buf(),
                message: e.message().to_string(),
            },
        })?;

        let workdir = repo
            .workdir()
            .ok_or_else(|| RepoError::Open {
                path: path.to_path_buf(),
                message: "bare repository has no worktree".to_string(),
            })?
            .to_path_buf();

        debug!(workdir = %workdir.display(), "opened repository");
        Ok(Self { repo, workdir })
    }

    fn oid(id: &CommitId) -> std::result::Result<Oid, BackendError> {
        Oid::from_str(id.as_str()).map_err(BackendError::from)
    }

    fn signature(author: &Identity) -> std::result::Result<Signature<'static>, BackendError> {
        Signature::now(author.name(), author.email()).map_err(BackendError::from)
    }

    /// Refuse to touch a worktree with uncommitted changes to tracked files.
    fn ensure_clean(&self) -> std::result::Result<(), BackendError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| BackendError::worktree(e.message()))?;

        let dirty: Vec<String> = statuses
            .iter()
            .filter(|entry| !entry.status().is_empty())
            .filter_map(|entry| entry.path().map(str::to_string))
            .collect();

        if dirty.is_empty() {
            Ok(())
        } else {
            Err(BackendError::worktree(format!(
                "uncommitted changes in {}",
                dirty.join(", ")
            )))
        }
    }

    /// Refuse a checkout that would replace untracked files with tracked ones.
    fn ensure_untracked_kept(&self, target: &git2::Tree<'_>) -> std::result::Result<(), BackendError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| BackendError::worktree(e.message()))?;

        let colliding: Vec<String> = statuses
            .iter()
            .filter(|entry| entry.status().is_wt_new())
            .filter_map(|entry| entry.path().map(str::to_string))
            .filter(|path| target.get_path(Path::new(path)).is_ok())
            .collect();

        if colliding.is_empty() {
            Ok(())
        } else {
            Err(BackendError::worktree(format!(
                "untracked files would be overwritten: {}",
                colliding.join(", ")
            )))
        }
    }

    fn head_commit(&self) -> std::result::Result<Option<git2::Commit<'_>>, BackendError> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Backend for GitBackend {
    fn workdir(&self) -> Option<&Path> {
        Some(&self.workdir)
    }

    fn resolve_ref(&self, refname: &str) -> std::result::Result<Option<CommitId>, BackendError> {
        let reference = match self.repo.find_reference(refname) {
            Ok(r) => r,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let commit = reference.peel_to_commit()?;
        Ok(Some(CommitId::new(commit.id().to_string())))
    }

    fn write_ref(&mut self, refname: &str, target: &CommitId, force: bool) -> std::result::Result<(), BackendError> {
        let oid = Self::oid(target)?;
        self.repo
            .reference(refname, oid, force, &format!("gpass: point {} at {}", refname, target.short()))?;
        trace!(refname, target = %target.short(), "ref written");
        Ok(())
    }

    fn delete_ref(&mut self, refname: &str) -> std::result::Result<(), BackendError> {
        self.repo.find_reference(refname)?.delete()?;
        trace!(refname, "ref deleted");
        Ok(())
    }

    fn list_refs(&self, prefix: &str) -> std::result::Result<Vec<String>, BackendError> {
        let pattern = format!("{}*", prefix);
        let mut names = Vec::new();
        for reference in self.repo.references_glob(&pattern)? {
            let reference = reference?;
            // Skip refs with non-UTF8 names.
            if let Some(name) = reference.name() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn head_branch(&self) -> std::result::Result<Option<String>, BackendError> {
        let head = self.repo.find_reference("HEAD")?;
        Ok(head.symbolic_target().map(str::to_string))
    }

    fn checkout(&mut self, request: &CheckoutRequest<'_>) -> std::result::Result<(), BackendError> {
        self.ensure_clean()?;

        let existing = self.resolve_ref(request.branch)?;
        if request.create && existing.is_some() {
            return Err(BackendError::new(format!("{} already exists", request.branch)));
        }

        let oid = match (request.target, request.create) {
            (Some(target), _) => Self::oid(target)?,
            (None, true) => self
                .head_commit()?
                .map(|commit| commit.id())
                .ok_or_else(|| BackendError::new("HEAD has no commit to branch from"))?,
            (None, false) => {
                let tip = existing.ok_or_else(|| BackendError::new(format!("{} not found", request.branch)))?;
                Self::oid(&tip)?
            }
        };

        let commit = self.repo.find_commit(oid)?;
        self.ensure_untracked_kept(&commit.tree()?)?;

        let mut opts = CheckoutBuilder::new();
        opts.force();
        self.repo
            .checkout_tree(commit.as_object(), Some(&mut opts))
            .map_err(|e| BackendError::worktree(e.message()))?;

        if request.create || request.target.is_some() {
            self.repo
                .reference(request.branch, oid, !request.create, "gpass: checkout")?;
        }

        if let Err(e) = self.repo.set_head(request.branch) {
            if request.create {
                if let Ok(mut created) = self.repo.find_reference(request.branch) {
                    let _ = created.delete();
                }
            }
            return Err(e.into());
        }

        trace!(branch = request.branch, commit = %oid, "checked out");
        Ok(())
    }

    fn stage_path(&mut self, path: &str) -> std::result::Result<(), BackendError> {
        let mut index = self
            .repo
            .index()
            .map_err(|e| BackendError::worktree(e.message()))?;
        index.add_path(Path::new(path))?;
        index.write()?;
        Ok(())
    }

    fn commit(&mut self, author: &Identity, message: &str) -> std::result::Result<CommitId, BackendError> {
        let mut index = self
            .repo
            .index()
            .map_err(|e| BackendError::worktree(e.message()))?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = Self::signature(author)?;
        let parent = self.head_commit()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(CommitId::new(oid.to_string()))
    }

    fn commit_root(
        &mut self,
        refname: &str,
        author: &Identity,
        message: &str,
    ) -> std::result::Result<CommitId, BackendError> {
        let tree_id = self.repo.treebuilder(None)?.write()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = Self::signature(author)?;

        let oid = self
            .repo
            .commit(Some(refname), &signature, &signature, message, &tree, &[])?;
        Ok(CommitId::new(oid.to_string()))
    }

    fn commit_info(&self, id: &CommitId) -> std::result::Result<CommitInfo, BackendError> {
        let commit = self.repo.find_commit(Self::oid(id)?)?;

        let author = commit.author();
        let time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH);

        Ok(CommitInfo {
            id: id.clone(),
            parents: commit
                .parent_ids()
                .map(|oid| CommitId::new(oid.to_string()))
                .collect(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repo::{branch_ref, Repository};
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    fn identity() -> Identity {
        Identity::new("Ada", "ada@example.com", "/home/ada")
    }

    /// Repository with a `README` committed on `main`.
    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let mut opts = git2::RepositoryInitOptions::new();
        opts.initial_head("main");
        git2::Repository::init_opts(dir.path(), &opts).unwrap();
        fs::write(dir.path().join("README"), "hello\n").unwrap();

        let mut repo = Repository::open(dir.path()).unwrap();
        repo.commit_file(&identity(), "README", "initial").unwrap();
        (dir, repo)
    }

    #[test]
    fn test_open_missing_repository() {
        let dir = TempDir::new().unwrap();
        let err = GitBackend::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Repo(RepoError::RepositoryNotFound(_))));
    }

    #[test]
    fn test_open_bare_repository() {
        let dir = TempDir::new().unwrap();
        git2::Repository::init_bare(dir.path()).unwrap();
        let err = GitBackend::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Repo(RepoError::Open { .. })));
    }

    #[test]
    fn test_orphan_branch_clears_tracked_files() {
        let (dir, mut repo) = init_repo();
        let root = repo.create_orphan_branch(&identity(), "alpha").unwrap();

        assert!(!dir.path().join("README").exists());
        assert!(repo.commit_info(&root).unwrap().is_root());
        assert_eq!(repo.current_branch().as_deref(), Some("alpha"));

        repo.checkout_branch("main").unwrap();
        assert!(dir.path().join("README").exists());
    }

    #[test]
    fn test_checkout_refuses_dirty_worktree() {
        let (dir, mut repo) = init_repo();
        repo.create_orphan_branch(&identity(), "alpha").unwrap();
        repo.checkout_branch("main").unwrap();
        fs::write(dir.path().join("README"), "changed\n").unwrap();

        let err = repo.checkout_branch("alpha").unwrap_err();
        assert!(matches!(err, Error::Repo(RepoError::Worktree { .. })));
        assert_eq!(repo.current_branch().as_deref(), Some("main"));
    }

    #[test]
    fn test_orphan_branch_removed_when_checkout_fails() {
        let (dir, mut repo) = init_repo();
        fs::write(dir.path().join("README"), "changed\n").unwrap();

        let err = repo.create_orphan_branch(&identity(), "alpha").unwrap_err();
        assert!(matches!(err, Error::Repo(RepoError::Worktree { .. })));
        assert!(!repo.branch_exists("alpha"));
        assert_eq!(repo.current_branch().as_deref(), Some("main"));
        assert_eq!(fs::read_to_string(dir.path().join("README")).unwrap(), "changed\n");
    }

    #[test]
    fn test_checkout_keeps_colliding_untracked_file() {
        let (dir, mut repo) = init_repo();
        let secret = dir.path().join("secret.gpg");
        repo.create_orphan_branch(&identity(), "alpha").unwrap();
        fs::write(&secret, "committed\n").unwrap();
        repo.commit_file(&identity(), "secret.gpg", "add").unwrap();
        repo.checkout_branch("main").unwrap();
        assert!(!secret.exists());

        fs::write(&secret, "stray\n").unwrap();
        let err = repo.checkout_branch("alpha").unwrap_err();
        match err {
            Error::Repo(RepoError::Worktree { message, .. }) => assert!(message.contains("secret.gpg")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(&secret).unwrap(), "stray\n");
        assert_eq!(repo.current_branch().as_deref(), Some("main"));

        // Unrelated untracked files do not block the switch.
        fs::remove_file(&secret).unwrap();
        fs::write(dir.path().join("notes.txt"), "scratch\n").unwrap();
        repo.checkout_branch("alpha").unwrap();
        assert_eq!(fs::read_to_string(&secret).unwrap(), "committed\n");
    }

    #[test]
    fn test_commit_picks_up_tracked_modifications() {
        let (dir, mut repo) = init_repo();
        let before = repo.branch_tip("main").unwrap();
        fs::write(dir.path().join("README"), "edited\n").unwrap();

        let id = repo.commit(&identity(), "edit").unwrap();
        let info = repo.commit_info(&id).unwrap();
        assert_eq!(info.parents, vec![before]);
        assert_eq!(info.author_name, "Ada");

        // Clean again: switching branches works.
        repo.create_orphan_branch(&identity(), "alpha").unwrap();
    }

    #[test]
    fn test_stage_missing_file_is_add_error() {
        let (_dir, mut repo) = init_repo();
        let err = repo.commit_file(&identity(), "nope.txt", "x").unwrap_err();
        assert!(matches!(err, Error::Repo(RepoError::Add { .. })));
    }

    #[test]
    fn test_head_branch_on_unborn_repository() {
        let dir = TempDir::new().unwrap();
        let mut opts = git2::RepositoryInitOptions::new();
        opts.initial_head("main");
        git2::Repository::init_opts(dir.path(), &opts).unwrap();

        let backend = GitBackend::open(dir.path()).unwrap();
        assert_eq!(backend.head_branch().unwrap(), Some(branch_ref("main")));
        assert_eq!(backend.resolve_ref(&branch_ref("main")).unwrap(), None);
    }
}
