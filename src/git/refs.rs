//! Git reference qualification
//!
//! A module reference is one of:
//! - `HEAD`, the remote's default branch tip
//! - a full ref name (`refs/heads/x`, `refs/tags/v1`), used verbatim
//! - a bare name, tried as a branch and then as a tag
//!
//! Qualification works on the advertised remote refs, so only the one ref needed is fetched.

use git2::Oid;

use crate::error::{BananaError, Result};

pub const HEAD: &str = "HEAD";

/// A ref advertised by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
    pub name: String,
    pub oid: Oid,
}

impl RemoteRef {
    pub fn new(name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            oid,
        }
    }
}

/// Turn a module reference into the full remote ref name to fetch
pub fn qualify_reference(
    reference: &str,
    advertised: &[RemoteRef],
    default_branch: Option<&str>,
) -> Result<String> {
    let exists = |name: &str| advertised.iter().any(|r| r.name == name);
    let not_found = |reason: String| BananaError::GitRefResolveFailed {
        git_ref: reference.to_string(),
        reason,
    };

    if reference == HEAD {
        if let Some(branch) = default_branch.filter(|b| exists(b)) {
            return Ok(branch.to_string());
        }
        // Fall back to the branch HEAD points at by object id
        let head = advertised
            .iter()
            .find(|r| r.name == HEAD)
            .ok_or_else(|| not_found("remote does not advertise HEAD".to_string()))?;
        return advertised
            .iter()
            .find(|r| r.name.starts_with("refs/heads/") && r.oid == head.oid)
            .map(|r| r.name.clone())
            .ok_or_else(|| not_found("no branch matches the remote HEAD".to_string()));
    }

    if reference.starts_with("refs/") {
        return if exists(reference) {
            Ok(reference.to_string())
        } else {
            Err(not_found("reference not found on remote".to_string()))
        };
    }

    [format!("refs/heads/{reference}"), format!("refs/tags/{reference}")]
        .into_iter()
        .find(|candidate| exists(candidate))
        .ok_or_else(|| not_found("no branch or tag with this name on remote".to_string()))
}

/// Local ref a fetched remote ref is stored under
pub fn local_ref_for(remote_ref: &str) -> String {
    match remote_ref.strip_prefix("refs/heads/") {
        Some(branch) => format!("refs/remotes/origin/{branch}"),
        None => remote_ref.to_string(),
    }
}
