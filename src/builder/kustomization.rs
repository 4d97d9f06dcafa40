//! Kustomization file data structures

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BananaError, Result};

/// File names recognised as a kustomization, in lookup order
pub const KUSTOMIZATION_FILES: &[&str] = &["kustomization.yaml", "kustomization.yml", "Kustomization"];

const KUSTOMIZATION_API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";
const COMPONENT_API_VERSION: &str = "kustomize.config.k8s.io/v1alpha1";
const KIND_KUSTOMIZATION: &str = "Kustomization";
const KIND_COMPONENT: &str = "Component";

/// A `kustomization.yaml` (or `kind: Component`) document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub common_labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<PatchEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches_strategic_merge: Vec<String>,
}

fn default_api_version() -> String {
    KUSTOMIZATION_API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND_KUSTOMIZATION.to_string()
}

/// An entry under `patches`: a bare path, or a mapping with `path` or inline `patch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchEntry {
    Path(String),
    Entry {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        patch: Option<String>,
    },
}

impl Default for Kustomization {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            namespace: String::new(),
            common_labels: BTreeMap::new(),
            resources: Vec::new(),
            components: Vec::new(),
            patches: Vec::new(),
            patches_strategic_merge: Vec::new(),
        }
    }
}

impl Kustomization {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty `kind: Component`
    pub fn component() -> Self {
        Self {
            api_version: COMPONENT_API_VERSION.to_string(),
            kind: KIND_COMPONENT.to_string(),
            ..Self::default()
        }
    }

    pub fn is_component(&self) -> bool {
        self.kind == KIND_COMPONENT
    }

    /// Locate the kustomization file in a directory
    pub fn find(dir: &Path) -> Option<PathBuf> {
        KUSTOMIZATION_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load the kustomization of a directory, returning the file it came from
    pub fn load(dir: &Path) -> Result<(PathBuf, Self)> {
        let path = Self::find(dir).ok_or_else(|| BananaError::CompositionFailed {
            path: dir.display().to_string(),
            reason: format!("no kustomization file found (looked for {})", KUSTOMIZATION_FILES.join(", ")),
        })?;

        let content = fs::read_to_string(&path).map_err(|e| BananaError::CompositionFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let kustomization = Self::from_yaml(&content).map_err(|e| BananaError::CompositionFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok((path, kustomization))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let kustomization: Self = serde_yaml::from_str(yaml)?;
        if kustomization.kind != KIND_KUSTOMIZATION && kustomization.kind != KIND_COMPONENT {
            return Err(BananaError::ConfigInvalid {
                message: format!("unsupported kustomization kind '{}'", kustomization.kind),
            });
        }
        Ok(kustomization)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write as `kustomization.yaml` into a directory
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(KUSTOMIZATION_FILES[0]);
        fs::write(&path, self.to_yaml()?).map_err(|e| BananaError::FileWriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }

    /// Every patch file path, `patchesStrategicMerge` after `patches`
    pub fn patch_paths(&self) -> impl Iterator<Item = &str> {
        self.patches
            .iter()
            .filter_map(|entry| match entry {
                PatchEntry::Path(path) => Some(path.as_str()),
                PatchEntry::Entry { path, .. } => path.as_deref(),
            })
            .chain(self.patches_strategic_merge.iter().map(String::as_str))
    }

    /// Inline patch bodies under `patches`
    pub fn inline_patches(&self) -> impl Iterator<Item = &str> {
        self.patches.iter().filter_map(|entry| match entry {
            PatchEntry::Entry { patch, .. } => patch.as_deref(),
            PatchEntry::Path(_) => None,
        })
    }
}
