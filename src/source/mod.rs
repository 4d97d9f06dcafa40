//! Module source handling
//!
//! This module handles the raw strings a manifest uses to point at modules:
//! - Source strings: local paths, `https://`, `ssh://`, `git@host:`, `file://` origins
//!   with an optional `//subdirectory` marker and `?ref=` query
//! - Secret tokens: `key=value` and `@key=path`
//!
//! ## Module Organization
//!
//! - `locator.rs`: source string splitting into origin, subdirectory and ref
//! - `secret.rs`: secret token parsing

pub mod locator;
pub mod secret;

pub use locator::{Located, locate};
pub use secret::Secret;
