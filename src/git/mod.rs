//! Git operations for retrieving remote modules
//!
//! This module handles:
//! - Qualifying a module reference against the remote's advertised refs
//! - Fetching exactly that reference (shallow for network remotes) and checking it out
//! - Authentication via git's native credential system
//! - Turning libgit2 errors into actionable messages
//!
//! ## Module Organization
//!
//! - `auth.rs`: credential callbacks (SSH agent, ~/.ssh keys, credential helpers)
//! - `checkout.rs`: detached checkout of a fetched commit
//! - `error.rs`: libgit2 error interpretation
//! - `fetch.rs`: single-reference fetch into a fresh repository
//! - `refs.rs`: reference qualification (`HEAD`, full refs, bare names)
//! - `url.rs`: origin classification and URL normalization

pub mod auth;
pub mod checkout;
pub mod error;
pub mod fetch;
pub mod refs;
pub mod url;

pub use fetch::fetch_reference;
pub use url::is_git_origin;
