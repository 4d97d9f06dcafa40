//! URL handling for git operations
//!
//! This module handles:
//! - Deciding whether an origin is a git remote or a plain directory
//! - Normalizing SCP-style SSH URLs to ssh:// format
//! - Normalizing file:// URLs for libgit2 compatibility

use std::borrow::Cow;
use std::path::{Path, PathBuf};

const REMOTE_SCHEMES: &[&str] = &["https://", "http://", "ssh://", "git://"];

/// Whether an origin is fetched through git rather than copied
///
/// `file://` URLs count as git only when they point at a repository; a plain directory
/// behind `file://` is copied like any other local origin.
pub fn is_git_origin(origin: &str) -> bool {
    if REMOTE_SCHEMES.iter().any(|scheme| origin.starts_with(scheme)) || is_scp_url(origin) {
        return true;
    }
    match file_url_path(origin) {
        Some(path) => path.join(".git").exists() || path.join("HEAD").is_file(),
        None => false,
    }
}

/// Local filesystem path behind a `file://` URL
pub fn file_url_path(origin: &str) -> Option<PathBuf> {
    origin.strip_prefix("file://").map(PathBuf::from)
}

/// Whether a URL refers to the local filesystem (no shallow fetch support)
pub fn is_local_url(url: &str) -> bool {
    url.starts_with("file://") || url.starts_with('/') || Path::new(url).is_absolute()
}

fn is_scp_url(url: &str) -> bool {
    !url.contains("://")
        && url
            .split_once(':')
            .is_some_and(|(user_host, _)| user_host.contains('@'))
}

/// Convert `git@host:org/repo` into `ssh://git@host/org/repo`
pub fn normalize_ssh_url(url: &str) -> Cow<'_, str> {
    if !is_scp_url(url) {
        return Cow::Borrowed(url);
    }
    match url.split_once(':') {
        Some((user_host, path)) => {
            let path = path.trim_start_matches('/');
            Cow::Owned(format!("ssh://{user_host}/{path}"))
        }
        None => Cow::Borrowed(url),
    }
}

/// Make `file://relative` and backslash paths absolute `file:///` URLs
pub fn normalize_file_url(url: &str) -> Cow<'_, str> {
    let Some(after) = url.strip_prefix("file://") else {
        return Cow::Borrowed(url);
    };
    if after.contains('\\') {
        return Cow::Owned(format!("file:///{}", after.replace('\\', "/").trim_start_matches('/')));
    }
    if !after.is_empty() && !after.starts_with('/') {
        return Cow::Owned(format!("file:///{after}"));
    }
    Cow::Borrowed(url)
}

/// Apply every normalization libgit2 needs
pub fn normalize_for_libgit2(url: &str) -> String {
    normalize_file_url(&normalize_ssh_url(url)).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{create_git_repo, create_temp_dir, file_url};

    #[test]
    fn test_normalize_ssh_url_scp_style() {
        assert_eq!(
            normalize_ssh_url("git@github.com:org/mods.git"),
            "ssh://git@github.com/org/mods.git"
        );
        assert_eq!(
            normalize_ssh_url("git@github.com:/abs/mods.git"),
            "ssh://git@github.com/abs/mods.git"
        );
    }

    #[test]
    fn test_normalize_leaves_other_urls() {
        for url in [
            "ssh://git@github.com/org/mods.git",
            "https://github.com/org/mods.git",
            "file:///srv/repo",
        ] {
            assert_eq!(normalize_for_libgit2(url), url);
        }
    }

    #[test]
    fn test_normalize_file_url() {
        assert_eq!(normalize_file_url("file://srv/repo"), "file:///srv/repo");
        assert_eq!(normalize_file_url("file://C:\\repo"), "file:///C:/repo");
    }

    #[test]
    fn test_is_git_origin() {
        assert!(is_git_origin("https://github.com/org/mods.git"));
        assert!(is_git_origin("git@github.com:org/mods.git"));
        assert!(!is_git_origin("modules"));
        assert!(!is_git_origin("/srv/modules"));
    }

    #[test]
    fn test_file_url_git_detection() {
        let (repo_dir, _repo) = create_git_repo();
        assert!(is_git_origin(&file_url(repo_dir.path())));

        let plain = create_temp_dir();
        assert!(!is_git_origin(&file_url(plain.path())));
    }

    #[test]
    fn test_is_local_url() {
        assert!(is_local_url("file:///srv/repo"));
        assert!(is_local_url("/srv/repo"));
        assert!(!is_local_url("https://github.com/org/mods.git"));
    }
}
