//! Banana - Kubernetes module bundler
//!
//! Reads a `banana.yaml` manifest, fetches every module it lists from a local catalog or a
//! git repository, composes the module with its components, patches ingress hostnames and
//! secrets, and exports the result as per-module directories or a single YAML stream.
//! Secrets can be envelope encrypted for a set of X25519 recipients.

pub mod builder;
pub mod bundle;
pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fetch;
pub mod git;
pub mod logging;
pub mod module;
pub mod operations;
pub mod progress;
pub mod resource;
pub mod source;
pub mod temp;
pub mod template;

#[cfg(test)]
pub(crate) mod test_fixtures;
