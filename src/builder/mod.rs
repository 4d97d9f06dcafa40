//! Overlay composition
//!
//! The [`Builder`] trait turns a directory tree of kustomizations into an ordered
//! [`ResourceSet`]. [`KustomizeBuilder`] implements the kustomize subset modules use:
//! - `resources`: YAML files (multi-document) and nested kustomization directories
//! - `components`: `kind: Component` layers applied on top of the parent's resources
//! - `namespace` and `commonLabels`
//! - `patches` / `patchesStrategicMerge`, merged into the resource with the same kind and name
//!
//! ## Module Organization
//!
//! - `kustomization.rs`: the kustomization file format
//! - `merge.rs`: strategic-merge style document merging

pub mod kustomization;
pub mod merge;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

use crate::config::{BuilderOptions, LoadRestrictions, Reorder};
use crate::error::{BananaError, Result};
use crate::resource::{Resource, ResourceSet, parse_documents};

pub use kustomization::Kustomization;

const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Kind order used by [`Reorder::Legacy`]; kinds not listed sort between the two groups
const ORDER_FIRST: &[&str] = &[
    "Namespace",
    "ResourceQuota",
    "StorageClass",
    "CustomResourceDefinition",
    "ServiceAccount",
    "PodSecurityPolicy",
    "Role",
    "ClusterRole",
    "RoleBinding",
    "ClusterRoleBinding",
    "ConfigMap",
    "Secret",
    "Endpoints",
    "Service",
    "LimitRange",
    "PriorityClass",
    "PersistentVolume",
    "PersistentVolumeClaim",
    "Deployment",
    "StatefulSet",
    "CronJob",
    "PodDisruptionBudget",
];
const ORDER_LAST: &[&str] = &["MutatingWebhookConfiguration", "ValidatingWebhookConfiguration"];

/// Produces resources from a directory tree
pub trait Builder {
    /// Build the kustomization at `root/path`
    fn build(&self, root: &Path, path: &str) -> Result<ResourceSet>;
}

/// Kustomize-compatible builder
#[derive(Debug, Clone, Default)]
pub struct KustomizeBuilder {
    options: BuilderOptions,
}

impl KustomizeBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Canonicalize a path and enforce the load restrictions
    fn checked_path(&self, root: &Path, candidate: &Path) -> Result<PathBuf> {
        let canonical =
            dunce::canonicalize(candidate).map_err(|e| BananaError::CompositionFailed {
                path: candidate.display().to_string(),
                reason: e.to_string(),
            })?;
        if self.options.load_restrictions == LoadRestrictions::RootOnly
            && !canonical.starts_with(root)
        {
            return Err(BananaError::CompositionFailed {
                path: candidate.display().to_string(),
                reason: format!("path escapes the build root {}", root.display()),
            });
        }
        Ok(canonical)
    }

    /// Build one kustomization layer on top of `base`
    ///
    /// Plain kustomizations start from an empty set; components receive their parent's
    /// resources and return them transformed.
    fn build_layer(
        &self,
        root: &Path,
        dir: &Path,
        base: ResourceSet,
        expect_component: bool,
        stack: &mut Vec<PathBuf>,
    ) -> Result<ResourceSet> {
        if stack.iter().any(|visited| visited == dir) {
            return Err(BananaError::CompositionFailed {
                path: dir.display().to_string(),
                reason: "cycle detected between kustomizations".to_string(),
            });
        }

        let (file, kustomization) = Kustomization::load(dir)?;
        let origin = file.display().to_string();
        if kustomization.is_component() != expect_component {
            let reason = if expect_component {
                "listed under components but is not a Component"
            } else {
                "a Component can only be listed under components"
            };
            return Err(BananaError::CompositionFailed {
                path: origin,
                reason: reason.to_string(),
            });
        }
        debug!(path = %origin, "building kustomization");

        stack.push(dir.to_path_buf());
        let mut resources = base;

        for entry in &kustomization.resources {
            let path = self.checked_path(root, &dir.join(entry))?;
            let loaded = if path.is_dir() {
                self.build_layer(root, &path, ResourceSet::new(), false, stack)?
            } else {
                load_resource_file(&path)?
            };
            resources.append(loaded).map_err(|id| BananaError::CompositionFailed {
                path: origin.clone(),
                reason: format!("duplicate resource {id}"),
            })?;
        }

        for entry in &kustomization.components {
            let path = self.checked_path(root, &dir.join(entry))?;
            resources = self.build_layer(root, &path, resources, true, stack)?;
        }

        for entry in kustomization.patch_paths() {
            let path = self.checked_path(root, &dir.join(entry))?;
            let content = read_file(&path)?;
            apply_patch_documents(&mut resources, &content, &path.display().to_string())?;
        }
        for body in kustomization.inline_patches() {
            apply_patch_documents(&mut resources, body, &origin)?;
        }

        apply_layer_metadata(&mut resources, &kustomization, &origin)?;

        stack.pop();
        Ok(resources)
    }

    fn finish(&self, resources: &mut ResourceSet) -> Result<()> {
        if self.options.add_managed_by_label {
            let key = MANAGED_BY_LABEL.to_string();
            let value = format!("banana-v{}", env!("CARGO_PKG_VERSION"));
            for resource in resources.iter_mut() {
                resource
                    .add_labels([(&key, &value)])
                    .map_err(|reason| BananaError::CompositionFailed {
                        path: resource.id().to_string(),
                        reason,
                    })?;
            }
        }

        if self.options.reorder == Reorder::Legacy {
            resources.sort_by_key(|resource| (kind_priority(resource.kind()), resource.id()));
        }
        Ok(())
    }
}

impl Builder for KustomizeBuilder {
    fn build(&self, root: &Path, path: &str) -> Result<ResourceSet> {
        let root = dunce::canonicalize(root).map_err(|e| BananaError::CompositionFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;
        let dir = self.checked_path(&root, &root.join(path))?;

        let mut stack = Vec::new();
        let mut resources = self.build_layer(&root, &dir, ResourceSet::new(), false, &mut stack)?;
        self.finish(&mut resources)?;

        debug!(root = %root.display(), count = resources.len(), "composition finished");
        Ok(resources)
    }
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| BananaError::CompositionFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_resource_file(path: &Path) -> Result<ResourceSet> {
    let origin = path.display().to_string();
    let mut set = ResourceSet::new();
    for resource in parse_documents(&read_file(path)?, &origin)? {
        set.push(resource).map_err(|id| BananaError::CompositionFailed {
            path: origin.clone(),
            reason: format!("duplicate resource {id}"),
        })?;
    }
    Ok(set)
}

/// Merge every document of a patch stream into its target resource
fn apply_patch_documents(resources: &mut ResourceSet, content: &str, origin: &str) -> Result<()> {
    let composition_error = |reason: String| BananaError::CompositionFailed {
        path: origin.to_string(),
        reason,
    };

    for document in serde_yaml::Deserializer::from_str(content) {
        let patch = Value::deserialize(document).map_err(|e| composition_error(e.to_string()))?;
        if patch.is_null() {
            continue;
        }
        let kind = patch.get("kind").and_then(Value::as_str).unwrap_or_default();
        let name = patch
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        if kind.is_empty() || name.is_empty() {
            return Err(composition_error(
                "patch must name its target with kind and metadata.name".to_string(),
            ));
        }

        let target = resources
            .find_by_kind_name_mut(kind, name)
            .ok_or_else(|| composition_error(format!("patch target {kind}/{name} not found")))?;
        let (kind, name) = (kind.to_string(), name.to_string());
        merge::merge_into(target.value_mut(), patch);
        debug!(target = %format!("{kind}/{name}"), patch = %origin, "applied patch");
    }
    Ok(())
}

/// Apply a layer's namespace and common labels
fn apply_layer_metadata(
    resources: &mut ResourceSet,
    kustomization: &Kustomization,
    origin: &str,
) -> Result<()> {
    let composition_error = |reason: String| BananaError::CompositionFailed {
        path: origin.to_string(),
        reason,
    };

    for resource in resources.iter_mut() {
        if !kustomization.namespace.is_empty() && !resource.is_cluster_scoped() {
            resource
                .set_namespace(&kustomization.namespace)
                .map_err(composition_error)?;
        }
        if !kustomization.common_labels.is_empty() {
            resource
                .add_labels(&kustomization.common_labels)
                .map_err(composition_error)?;
        }
    }
    Ok(())
}

fn kind_priority(kind: &str) -> usize {
    if let Some(pos) = ORDER_FIRST.iter().position(|k| *k == kind) {
        pos
    } else if let Some(pos) = ORDER_LAST.iter().position(|k| *k == kind) {
        ORDER_FIRST.len() + 1 + pos
    } else {
        ORDER_FIRST.len()
    }
}
