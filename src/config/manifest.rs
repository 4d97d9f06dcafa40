//! Manifest (banana.yaml) data structures

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BananaError, Result};

/// Default manifest file name
pub const MANIFEST_FILE: &str = "banana.yaml";

pub const API_VERSION: &str = "banana.io/v1alpha1";

pub const KIND: &str = "Banana";

/// Manifest listing the modules to assemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BananaFile {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    /// Name of the cluster or environment the manifest describes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

/// A module entry in the manifest
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Local path beneath the default origin, or a remote source string
    pub name: String,

    /// Tag to fetch, used as `refs/tags/<version>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Explicit reference, takes precedence over `version`
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<HostPolicy>,

    /// Raw `key=value` / `@key=path` tokens
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<String>,

    #[serde(default, skip_serializing_if = "ModuleOpts::is_empty")]
    pub opts: ModuleOpts,

    #[serde(default, skip_serializing_if = "ModuleKind::is_default")]
    pub kind: ModuleKind,
}

/// A component reference, either a bare name or a name with a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentEntry {
    Name(String),
    Pinned {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },
}

impl ComponentEntry {
    pub fn name(&self) -> &str {
        match self {
            ComponentEntry::Name(name) | ComponentEntry::Pinned { name, .. } => name,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            ComponentEntry::Name(_) => None,
            ComponentEntry::Pinned { version, .. } => version.as_deref(),
        }
    }
}

/// Ingress hostname naming policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HostPolicy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wildcard: String,

    /// Fixed hostname, overrides prefix and wildcard
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,

    /// Separator between prefix and name, `-` when empty
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delimiter: String,
}

/// Module options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleOpts {
    /// Values handed to `.tmpl` files in the module
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, serde_yaml::Value>,
}

impl ModuleOpts {
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// How a module's sources are turned into resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// A directory with a `kustomization.yaml`
    #[default]
    Kustomize,
}

impl ModuleKind {
    fn is_default(&self) -> bool {
        *self == ModuleKind::default()
    }
}

impl BananaFile {
    /// Create an empty manifest
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            name: name.into(),
            modules: Vec::new(),
        }
    }

    /// Load and validate a manifest from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BananaError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| BananaError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            BananaError::ConfigParseFailed { reason, .. } => BananaError::ConfigParseFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse a manifest from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(yaml)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Serialize the manifest to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the manifest
    pub fn validate(&self) -> Result<()> {
        if self.kind != KIND {
            return Err(BananaError::ConfigInvalid {
                message: format!("expected kind '{KIND}', found '{}'", self.kind),
            });
        }

        for module in &self.modules {
            module.validate()?;
        }

        Ok(())
    }
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validate a single module entry
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BananaError::ConfigInvalid {
                message: "module name must not be empty".to_string(),
            });
        }

        for component in &self.components {
            let name = component.name();
            let escapes = name.is_empty()
                || Path::new(name).is_absolute()
                || name.starts_with('/')
                || name.split('/').any(|segment| segment == "..");
            if escapes {
                return Err(BananaError::ConfigInvalid {
                    message: format!(
                        "component '{name}' of module '{}' must be a relative path inside the module",
                        self.name
                    ),
                });
            }
        }

        Ok(())
    }
}
