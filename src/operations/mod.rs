//! Operations module for building and vendoring manifests
//!
//! This module provides high-level operations that coordinate:
//! - BuildOperation: resolve, assemble and export every module
//! - VendorOperation: resolve and fetch every module's sources
//!
//! The operations coordinate with:
//! - Module resolution (from module module)
//! - Fetcher, Builder and Encryptor collaborators
//! - Bundle assembly and export (from bundle module)
//! - Progress reporting (from progress module)
//!
//! Modules are processed strictly in manifest order and the run stops at the first
//! failing module.

pub mod build;
pub mod vendor;

pub use build::{BuildOperation, BuildSummary, BuildTarget};
pub use vendor::VendorOperation;
