//! Module resolution
//!
//! Turns a manifest entry into a fully resolved, immutable module descriptor: where to
//! fetch it from, which reference, which subdirectory and which components to build.
//!
//! ## Module Organization
//!
//! - `host.rs`: ingress hostname naming policy

pub mod host;

use tracing::{debug, warn};

pub use crate::config::ModuleKind;
use crate::config::{HostPolicy, ModuleOpts, ModuleSpec};
use crate::error::Result;
use crate::source::{Located, Secret, locate};

pub use host::compute_host;

/// Reference used when nothing else pins the module
pub const DEFAULT_REFERENCE: &str = "HEAD";

/// A module ready to be fetched and built
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedModule {
    /// Directory name the module is fetched into and exported under
    pub display_name: String,
    /// Bare remote or local location, subdirectory marker stripped
    pub origin: String,
    /// Path inside the origin to fetch
    pub subdirectory: String,
    /// Single effective reference
    pub reference: String,
    pub namespace: String,
    /// Component directories, relative to the composition root
    pub component_paths: Vec<String>,
    pub host_policy: Option<HostPolicy>,
    pub secrets: Vec<Secret>,
    pub opts: ModuleOpts,
    pub kind: ModuleKind,
}

impl ResolvedModule {
    /// Data keys of the declared secrets, in declaration order
    pub fn secret_keys(&self) -> Vec<String> {
        self.secrets
            .iter()
            .map(|secret| secret.data_key().to_string())
            .collect()
    }
}

/// Resolve a manifest entry against the default origin
pub fn resolve(spec: &ModuleSpec, default_origin: &str) -> Result<ResolvedModule> {
    spec.validate()?;
    match spec.kind {
        ModuleKind::Kustomize => resolve_kustomize(spec, default_origin),
    }
}

fn resolve_kustomize(spec: &ModuleSpec, default_origin: &str) -> Result<ResolvedModule> {
    // A source that fails to parse as a URL is a local module name
    let remote = match locate(&spec.name) {
        Ok(located) if located.is_remote() => Some(located),
        Ok(_) => None,
        Err(err) => {
            debug!(module = %spec.name, error = %err, "source is not a valid URL, treating as local");
            None
        }
    };

    let (display_name, origin, subdirectory, embedded_ref) = match remote {
        Some(Located {
            origin,
            subdirectory,
            embedded_ref,
        }) => {
            let display_name = remote_display_name(&origin, &subdirectory);
            (display_name, origin, subdirectory, embedded_ref)
        }
        None => {
            let name = spec.name.trim_matches('/').to_string();
            (name.clone(), default_origin.to_string(), name, None)
        }
    };

    let reference = effective_reference(spec, embedded_ref.as_deref());

    for (component, version) in pinned_components(spec) {
        warn!(
            module = %display_name,
            component,
            version,
            "component version ignored, components are built from the module's own checkout"
        );
    }

    let component_paths = spec
        .components
        .iter()
        .map(|component| format!("{display_name}/{}", component.name()))
        .collect();

    let secrets = spec
        .secrets
        .iter()
        .map(|token| Secret::parse(token))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        module = %display_name,
        origin = %origin,
        subdirectory = %subdirectory,
        reference = %reference,
        "resolved module"
    );

    Ok(ResolvedModule {
        display_name,
        origin,
        subdirectory,
        reference,
        namespace: spec.namespace.clone(),
        component_paths,
        host_policy: spec.host.clone(),
        secrets,
        opts: spec.opts.clone(),
        kind: spec.kind,
    })
}

/// Components carrying a version, which has no effect
fn pinned_components(spec: &ModuleSpec) -> Vec<(&str, &str)> {
    spec.components
        .iter()
        .filter_map(|component| {
            component
                .version()
                .filter(|version| !version.trim().is_empty())
                .map(|version| (component.name(), version))
        })
        .collect()
}

/// Explicit ref, then the version tag, then the embedded ref, then `HEAD`
fn effective_reference(spec: &ModuleSpec, embedded_ref: Option<&str>) -> String {
    fn non_empty(value: Option<&str>) -> Option<&str> {
        value.filter(|v| !v.trim().is_empty())
    }

    if let Some(git_ref) = non_empty(spec.git_ref.as_deref()) {
        return git_ref.to_string();
    }
    if let Some(version) = non_empty(spec.version.as_deref()) {
        return format!("refs/tags/{version}");
    }
    if let Some(embedded) = non_empty(embedded_ref) {
        return embedded.to_string();
    }
    DEFAULT_REFERENCE.to_string()
}

fn remote_display_name(origin: &str, subdirectory: &str) -> String {
    let trimmed = subdirectory.trim_matches('/');
    if let Some(last) = trimmed.rsplit('/').next().filter(|s| !s.is_empty()) {
        return last.to_string();
    }

    let last = origin
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(origin);
    last.strip_suffix(".git").unwrap_or(last).to_string()
}
