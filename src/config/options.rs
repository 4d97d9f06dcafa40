//! Runtime options for a build
//!
//! Everything here is constructed once from CLI arguments and passed explicitly through the
//! pipeline; nothing is read from process-wide state.

use std::path::PathBuf;

/// Origin local module names are resolved beneath when none is given
pub const DEFAULT_ORIGIN: &str = "modules";

/// Resource ordering applied after composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reorder {
    /// Keep the order resources were declared in
    #[default]
    None,
    /// Sort by kind priority (namespaces and CRDs first, webhooks last)
    Legacy,
}

/// Which paths a kustomization may load from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadRestrictions {
    /// Reject any path escaping the build root
    #[default]
    RootOnly,
    None,
}

/// Options for the overlay builder
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuilderOptions {
    pub reorder: Reorder,
    pub add_managed_by_label: bool,
    pub load_restrictions: LoadRestrictions,
}

/// Options for writing bundles out
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportOptions {
    /// Prefix for every written path, below the target directory
    pub root_dir: Option<PathBuf>,
    /// Base64 X25519 public keys; empty disables encryption
    pub recipients: Vec<String>,
}

/// Everything a build needs besides the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub default_origin: String,
    /// Directory relative local origins and file secrets are resolved against
    pub base_dir: PathBuf,
    pub builder: BuilderOptions,
    pub export: ExportOptions,
}

impl BuildOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            default_origin: DEFAULT_ORIGIN.to_string(),
            base_dir: base_dir.into(),
            builder: BuilderOptions::default(),
            export: ExportOptions::default(),
        }
    }

    pub fn with_default_origin(mut self, origin: impl Into<String>) -> Self {
        self.default_origin = origin.into();
        self
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.export.recipients = recipients
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }

    pub fn with_root_dir(mut self, root_dir: Option<PathBuf>) -> Self {
        self.export.root_dir = root_dir;
        self
    }
}
