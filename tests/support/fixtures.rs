//! Repository and identity fixtures.

use std::path::Path;

use gpass::core::identity::Identity;

/// Git config written into test home directories.
pub const GITCONFIG: &str = "[user]\n\tname = Test User\n\temail = test@example.com\n";

/// Identity matching [`GITCONFIG`].
pub fn identity() -> Identity {
    Identity::new("Test User", "test@example.com", "/nonexistent")
}

pub fn write_gitconfig(home: &Path) {
    std::fs::write(home.join(".gitconfig"), GITCONFIG).expect("failed to write .gitconfig");
}

/// Initialize a repository at `path` with a `README` committed on `main`.
pub fn init_repo(path: &Path) -> git2::Repository {
    let mut opts = git2::RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = git2::Repository::init_opts(path, &opts).expect("failed to init repo");

    std::fs::write(path.join("README"), "secret store\n").expect("failed to write README");
    {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README")).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
    }
    repo
}

/// Files tracked at the tip of `branch`.
pub fn tree_files(repo: &git2::Repository, branch: &str) -> Vec<String> {
    let commit = repo
        .find_reference(&format!("refs/heads/{}", branch))
        .unwrap()
        .peel_to_commit()
        .unwrap();
    let tree = commit.tree().unwrap();
    tree.iter()
        .filter_map(|entry| entry.name().map(str::to_string))
        .collect()
}
