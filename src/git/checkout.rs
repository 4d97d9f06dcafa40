//! Checkout of fetched commits

use git2::{Oid, Repository, build::CheckoutBuilder};

use crate::error::{BananaError, Result};

/// Detach HEAD at a commit and force the working tree to match it
pub fn checkout_commit(repo: &Repository, oid: Oid) -> Result<()> {
    let checkout_error = |e: git2::Error| BananaError::GitCheckoutFailed {
        sha: oid.to_string(),
        reason: e.message().to_string(),
    };

    repo.set_head_detached(oid).map_err(checkout_error)?;

    let mut builder = CheckoutBuilder::new();
    builder.force();
    repo.checkout_head(Some(&mut builder)).map_err(checkout_error)
}
