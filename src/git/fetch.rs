//! Shallow single-reference retrieval
//!
//! Instead of cloning every branch, an empty repository is initialized, the remote's refs
//! are listed, and only the ref the module asks for is fetched (depth 1 for network
//! remotes) and checked out.

use std::path::Path;

use git2::{AutotagOption, Direction, FetchOptions, Oid, Remote, RemoteCallbacks, Repository};
use tracing::debug;

use super::auth::setup_auth_callbacks;
use super::checkout::checkout_commit;
use super::error::interpret_git_error;
use super::refs::{RemoteRef, local_ref_for, qualify_reference};
use super::url::{is_local_url, normalize_for_libgit2};
use crate::error::{BananaError, Result};

/// Fetch `reference` from `url` into a fresh repository at `workdir` and check it out
///
/// Returns the id of the checked out commit.
pub fn fetch_reference(url: &str, reference: &str, workdir: &Path) -> Result<Oid> {
    let clone_error = |e: git2::Error| BananaError::GitCloneFailed {
        url: url.to_string(),
        reason: interpret_git_error(&e),
    };

    let repo = Repository::init(workdir).map_err(clone_error)?;
    let mut remote = repo
        .remote_anonymous(&normalize_for_libgit2(url))
        .map_err(clone_error)?;

    let (advertised, default_branch) = list_remote(&mut remote).map_err(clone_error)?;
    let qualified = qualify_reference(reference, &advertised, default_branch.as_deref())?;
    let local = local_ref_for(&qualified);
    debug!(url, reference, qualified = %qualified, "fetching reference");

    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);
    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(callbacks);
    fetch_options.download_tags(AutotagOption::None);
    // libgit2 does not support shallow fetches over the local transport
    if !is_local_url(url) {
        fetch_options.depth(1);
    }

    let refspec = format!("+{qualified}:{local}");
    remote
        .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
        .map_err(|e| BananaError::GitFetchFailed {
            reason: format!("{url} {qualified}: {}", interpret_git_error(&e)),
        })?;

    let commit = repo
        .find_reference(&local)
        .and_then(|r| r.peel_to_commit())
        .map_err(|e| BananaError::GitRefResolveFailed {
            git_ref: qualified.clone(),
            reason: e.message().to_string(),
        })?;

    checkout_commit(&repo, commit.id())?;
    Ok(commit.id())
}

/// Advertised refs and the default branch of a remote
fn list_remote(
    remote: &mut Remote<'_>,
) -> std::result::Result<(Vec<RemoteRef>, Option<String>), git2::Error> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);
    let connection = remote.connect_auth(Direction::Fetch, Some(callbacks), None)?;

    let advertised = connection
        .list()?
        .iter()
        .map(|head| RemoteRef::new(head.name(), head.oid()))
        .collect();
    let default_branch = connection
        .default_branch()
        .ok()
        .and_then(|buf| buf.as_str().map(str::to_string));

    Ok((advertised, default_branch))
}
