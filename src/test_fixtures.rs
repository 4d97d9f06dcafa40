//! Test fixtures and utilities for reducing test setup duplication.
//!
//! This module provides helper functions to create common test environments
//! (temp directories, module trees, git repos) with a single function call.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_fixtures::{create_temp_dir, create_git_repo, commit_all};
//!
//! #[test]
//! fn my_test() {
//!     let temp = create_temp_dir();
//!
//!     let (temp, repo) = create_git_repo();
//!     create_test_files(temp.path(), &[("app/kustomization.yaml", "resources: []\n")]);
//!     commit_all(&repo, "initial");
//! }
//! ```

use std::path::Path;

use git2::{IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

/// Create a temp directory in the system temp location.
///
/// Uses `crate::temp::temp_dir_base()` to ensure temp dirs are never
/// created under the current working directory.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new_in(crate::temp::temp_dir_base()).expect("Failed to create temp directory")
}

/// Create a temp directory with a git repository whose initial branch is `main`.
///
/// # Panics
///
/// Panics if the temp directory or git repository cannot be created.
#[must_use]
pub fn create_git_repo() -> (TempDir, Repository) {
    let temp = create_temp_dir();
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    let repo = Repository::init_opts(temp.path(), &options).expect("Failed to init git repository");
    (temp, repo)
}

/// Stage every file in the working tree and commit it on the current branch.
///
/// # Panics
///
/// Panics if staging or committing fails.
pub fn commit_all(repo: &Repository, message: &str) -> Oid {
    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let signature = Signature::now("Banana Test", "test@banana.io").expect("Failed to create signature");

    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .expect("Failed to commit")
}

/// Create a lightweight tag pointing at a commit.
///
/// # Panics
///
/// Panics if the tag cannot be created.
pub fn tag(repo: &Repository, name: &str, commit: Oid) {
    let object = repo.find_object(commit, None).expect("Failed to find commit");
    repo.tag_lightweight(name, &object, false)
        .expect("Failed to create tag");
}

/// Create test files in a directory.
///
/// Takes a list of (path, content) tuples and creates those files.
/// Paths are relative to the provided base directory.
///
/// # Panics
///
/// Panics if any file cannot be created.
pub fn create_test_files(base: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full_path = base.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&full_path, content).expect("Failed to write test file");
    }
}

/// `file://` URL for a local path
#[must_use]
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_temp_dir() {
        let temp = create_temp_dir();
        assert!(temp.path().exists());
    }

    #[test]
    fn test_create_git_repo_and_commit() {
        let (temp, repo) = create_git_repo();
        create_test_files(temp.path(), &[("app/a.yaml", "a: 1\n")]);
        let first = commit_all(&repo, "first");
        tag(&repo, "v1", first);

        create_test_files(temp.path(), &[("app/a.yaml", "a: 2\n")]);
        let second = commit_all(&repo, "second");

        let head = repo.head().expect("head").peel_to_commit().expect("commit");
        assert_eq!(head.id(), second);
        assert_eq!(head.parent_id(0).expect("parent"), first);
        assert_eq!(repo.head().expect("head").shorthand(), Some("main"));
        assert!(repo.find_reference("refs/tags/v1").is_ok());
    }

    #[test]
    fn test_create_test_files() {
        let temp = create_temp_dir();
        create_test_files(
            temp.path(),
            &[("base/kustomization.yaml", "resources: []\n"), ("x.yaml", "x: 1\n")],
        );
        assert!(temp.path().join("base/kustomization.yaml").exists());
        let content = std::fs::read_to_string(temp.path().join("x.yaml")).expect("Failed to read");
        assert_eq!(content, "x: 1\n");
    }
}
