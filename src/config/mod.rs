//! Configuration handling for Banana
//!
//! This module contains data structures for:
//! - `banana.yaml` - the module manifest
//! - build, builder and export options assembled from the command line

pub mod manifest;
pub mod options;

// Re-export commonly used types
pub use manifest::{
    BananaFile, ComponentEntry, HostPolicy, MANIFEST_FILE, ModuleKind, ModuleOpts, ModuleSpec,
};
pub use options::{
    BuildOptions, BuilderOptions, DEFAULT_ORIGIN, ExportOptions, LoadRestrictions, Reorder,
};
