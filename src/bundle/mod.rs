//! Bundle assembly
//!
//! A [`Bundle`] is the resource set of one module after composition and patching. It is
//! produced by [`assemble`] and consumed exactly once by [`Bundle::export`] or
//! [`Bundle::flatten`].
//!
//! Assembly runs in order:
//! 1. fetch the module into a fresh work directory and render its `.tmpl` files
//! 2. write the composition root `kustomization.yaml` (namespace, module, components)
//! 3. build the composition root
//! 4. set ingress hostnames from the module's host policy
//! 5. inject declared secret values into Secrets that already declare the key
//!
//! ## Module Organization
//!
//! - `export.rs`: writing bundles as files or a YAML stream, encrypting Secrets

pub mod export;

use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_yaml::Value;
use tracing::{debug, info};

use crate::builder::{Builder, Kustomization};
use crate::config::BuildOptions;
use crate::error::{BananaError, Result, Stage, StageContext};
use crate::fetch::Fetcher;
use crate::module::{ResolvedModule, compute_host};
use crate::resource::{FieldPath, Gvk, ResourceSet, StructuralPatch};
use crate::{temp, template};

/// Resources of one module, ready to export
#[derive(Debug)]
pub struct Bundle {
    module: ResolvedModule,
    resources: ResourceSet,
    composition: Kustomization,
    patches: Vec<StructuralPatch>,
}

impl Bundle {
    pub fn new(module: ResolvedModule, resources: ResourceSet, composition: Kustomization) -> Self {
        Self {
            module,
            resources,
            composition,
            patches: Vec::new(),
        }
    }

    pub fn module(&self) -> &ResolvedModule {
        &self.module
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    /// The composition root the resources were built from
    pub fn composition(&self) -> &Kustomization {
        &self.composition
    }

    /// Structural patches applied so far, in order
    pub fn patches(&self) -> &[StructuralPatch] {
        &self.patches
    }

    /// Apply a structural patch, returning `false` when the same patch was already applied
    pub fn apply_patch(&mut self, patch: StructuralPatch) -> Result<bool> {
        if self.patches.contains(&patch) {
            return Ok(false);
        }

        let patch_error = |reason: String| BananaError::PatchFailed {
            resource: patch.id.to_string(),
            field: patch.path.to_string(),
            reason,
        };
        let resource = self
            .resources
            .get_mut(&patch.id)
            .ok_or_else(|| patch_error("resource not found in bundle".to_string()))?;
        resource
            .set(&patch.path, patch.value.clone())
            .map_err(patch_error)?;

        debug!(resource = %patch.id, field = %patch.path, "applied patch");
        self.patches.push(patch);
        Ok(true)
    }

    /// Point every rule of every Ingress at the hostname the module's policy gives it
    ///
    /// An Ingress without rules gets rule 0 created. Nothing happens when the policy yields
    /// an empty hostname.
    pub fn apply_hosts(&mut self) -> Result<()> {
        for id in self.resources.ids_matching(&Gvk::ingress()) {
            let host = compute_host(self.module.host_policy.as_ref(), &id.name);
            if host.is_empty() {
                continue;
            }

            let rules = self
                .resources
                .get(&id)
                .and_then(|resource| resource.get(&FieldPath::parse("spec.rules")))
                .and_then(Value::as_sequence)
                .map_or(0, Vec::len);

            for index in 0..rules.max(1) {
                let path = FieldPath::new()
                    .key("spec")
                    .key("rules")
                    .index(index)
                    .key("host");
                self.apply_patch(StructuralPatch::new(id.clone(), path, host.as_str()))?;
            }
            info!(ingress = %id.name, host = %host, "set ingress host");
        }
        Ok(())
    }

    /// Write declared secret values into the Secrets that declare their keys
    ///
    /// Inline values are written as given. File secrets are read relative to `base_dir`
    /// and their contents base64 encoded. A key no Secret declares is skipped.
    pub fn apply_secrets(&mut self, base_dir: &Path) -> Result<()> {
        if self.module.secrets.is_empty() {
            return Ok(());
        }

        let secret_ids = self.resources.ids_matching(&Gvk::secret());
        for secret in self.module.secrets.clone() {
            let path = FieldPath::new().key("data").key(secret.data_key());
            let targets: Vec<_> = secret_ids
                .iter()
                .filter(|id| {
                    self.resources
                        .get(id)
                        .and_then(|resource| resource.get(&path))
                        .is_some()
                })
                .cloned()
                .collect();
            if targets.is_empty() {
                debug!(key = secret.data_key(), "no Secret declares key, skipping");
                continue;
            }

            let value = if secret.is_file {
                let file = base_dir.join(&secret.value);
                let raw = fs::read(&file).map_err(|e| BananaError::FileReadFailed {
                    path: file.display().to_string(),
                    reason: e.to_string(),
                })?;
                STANDARD.encode(raw)
            } else {
                secret.value.clone()
            };

            for id in targets {
                self.apply_patch(StructuralPatch::new(id.clone(), path.clone(), value.as_str()))?;
                info!(secret = %id.name, key = secret.data_key(), "injected secret");
            }
        }
        Ok(())
    }
}

/// Fetch, compose and patch a module
///
/// Failures are wrapped with the stage they happened in.
pub fn assemble(
    module: &ResolvedModule,
    fetcher: &dyn Fetcher,
    builder: &dyn Builder,
    options: &BuildOptions,
) -> Result<Bundle> {
    let name = module.display_name.as_str();
    let root = temp::work_dir("banana-build-").stage(name, Stage::Fetch)?;
    let module_dir = root.path().join(&module.display_name);

    info!(module = name, origin = %module.origin, reference = %module.reference, "fetching");
    fetcher
        .fetch(&module.origin, &module.reference, &module.subdirectory, &module_dir)
        .stage(name, Stage::Fetch)?;

    template::render_dir(&module_dir, &module.opts.vars).stage(name, Stage::Compose)?;

    let composition = composition_root(module);
    composition.write(root.path()).stage(name, Stage::Compose)?;
    let resources = builder.build(root.path(), ".").stage(name, Stage::Compose)?;
    debug!(module = name, resources = resources.len(), "composed");

    let mut bundle = Bundle::new(module.clone(), resources, composition);
    bundle.apply_hosts().stage(name, Stage::Patch)?;
    bundle.apply_secrets(&options.base_dir).stage(name, Stage::Patch)?;

    Ok(bundle)
}

fn composition_root(module: &ResolvedModule) -> Kustomization {
    Kustomization {
        namespace: module.namespace.clone(),
        resources: vec![module.display_name.clone()],
        components: module.component_paths.clone(),
        ..Kustomization::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indoc::indoc;

    use super::*;
    use crate::builder::KustomizeBuilder;
    use crate::config::{HostPolicy, ModuleSpec};
    use crate::module::resolve;
    use crate::resource::{ResId, Resource};
    use crate::test_fixtures::{create_temp_dir, create_test_files};

    /// Copies a fixed directory, ignoring origin and reference
    struct DirFetcher(PathBuf);

    impl Fetcher for DirFetcher {
        fn fetch(&self, _origin: &str, _reference: &str, _subdirectory: &str, dest: &Path) -> Result<()> {
            crate::common::fs::copy_dir_recursive(&self.0, dest, &Default::default())?;
            Ok(())
        }
    }

    struct FailingFetcher;

    impl Fetcher for FailingFetcher {
        fn fetch(&self, origin: &str, _reference: &str, _subdirectory: &str, _dest: &Path) -> Result<()> {
            Err(BananaError::ModuleNotFound {
                path: origin.to_string(),
            })
        }
    }

    const INGRESS: &str = indoc! {r#"
        apiVersion: networking.k8s.io/v1
        kind: Ingress
        metadata:
          name: test-ingress
        spec:
          rules:
            - http:
                paths: []
            - host: old.example.com
    "#};

    const SECRET: &str = indoc! {r#"
        apiVersion: v1
        kind: Secret
        metadata:
          name: creds
        data:
          token: ""
    "#};

    fn module_with(spec: ModuleSpec) -> ResolvedModule {
        resolve(&spec, "modules").unwrap()
    }

    fn bundle_of(module: ResolvedModule, docs: &[&str]) -> Bundle {
        let mut resources = ResourceSet::new();
        for doc in docs {
            resources.push(Resource::from_yaml(doc).unwrap()).unwrap();
        }
        Bundle::new(module, resources, Kustomization::new())
    }

    fn ingress_id() -> ResId {
        ResId::new(Gvk::ingress(), "", "test-ingress")
    }

    fn host_spec() -> ModuleSpec {
        let mut spec = ModuleSpec::new("web");
        spec.host = Some(HostPolicy {
            prefix: "infra".to_string(),
            ..HostPolicy::default()
        });
        spec
    }

    #[test]
    fn test_apply_hosts_sets_every_rule() {
        let mut bundle = bundle_of(module_with(host_spec()), &[INGRESS]);
        bundle.apply_hosts().unwrap();

        let ingress = bundle.resources().get(&ingress_id()).unwrap();
        for index in 0..2 {
            let path = FieldPath::new().key("spec").key("rules").index(index).key("host");
            assert_eq!(ingress.get(&path).and_then(Value::as_str), Some("infra-test-ingress"));
        }
        assert_eq!(bundle.patches().len(), 2);
    }

    #[test]
    fn test_apply_hosts_is_idempotent() {
        let mut bundle = bundle_of(module_with(host_spec()), &[INGRESS]);
        bundle.apply_hosts().unwrap();
        let once = bundle.resources().clone();
        let patches = bundle.patches().len();

        bundle.apply_hosts().unwrap();
        assert_eq!(bundle.resources(), &once);
        assert_eq!(bundle.patches().len(), patches);
    }

    #[test]
    fn test_apply_hosts_creates_first_rule() {
        let ingress = indoc! {r#"
            apiVersion: networking.k8s.io/v1
            kind: Ingress
            metadata:
              name: bare
        "#};
        let mut bundle = bundle_of(module_with(host_spec()), &[ingress]);
        bundle.apply_hosts().unwrap();

        let id = ResId::new(Gvk::ingress(), "", "bare");
        let rules = bundle
            .resources()
            .get(&id)
            .unwrap()
            .get(&FieldPath::parse("spec.rules"))
            .and_then(Value::as_sequence)
            .unwrap()
            .clone();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["host"].as_str(), Some("infra-bare"));
    }

    #[test]
    fn test_apply_hosts_without_policy_is_noop() {
        let mut bundle = bundle_of(module_with(ModuleSpec::new("web")), &[INGRESS]);
        bundle.apply_hosts().unwrap();
        assert!(bundle.patches().is_empty());
    }

    #[test]
    fn test_apply_hosts_rejects_malformed_rules() {
        let ingress = indoc! {r#"
            apiVersion: networking.k8s.io/v1
            kind: Ingress
            metadata:
              name: broken
            spec:
              rules: not-a-list
        "#};
        let mut bundle = bundle_of(module_with(host_spec()), &[ingress]);
        let err = bundle.apply_hosts().unwrap_err();
        assert!(matches!(err, BananaError::PatchFailed { .. }));
    }

    #[test]
    fn test_apply_secrets_only_touches_declared_keys() {
        let mut spec = ModuleSpec::new("app");
        spec.secrets = vec!["token=abc".to_string(), "missing=zzz".to_string()];
        let mut bundle = bundle_of(module_with(spec), &[SECRET]);

        bundle.apply_secrets(Path::new("/unused")).unwrap();

        let secret = bundle
            .resources()
            .get(&ResId::new(Gvk::secret(), "", "creds"))
            .unwrap();
        assert_eq!(
            secret.get(&FieldPath::parse("data.token")).and_then(Value::as_str),
            Some("abc")
        );
        assert!(secret.get(&FieldPath::parse("data.missing")).is_none());
        assert_eq!(bundle.resources().len(), 1);
    }

    #[test]
    fn test_apply_secrets_keeps_encoded_values() {
        let mut spec = ModuleSpec::new("app");
        spec.secrets = vec!["token=c2VjcmV0".to_string()];
        let mut bundle = bundle_of(module_with(spec), &[SECRET]);

        bundle.apply_secrets(Path::new("/unused")).unwrap();

        let secret = bundle
            .resources()
            .get(&ResId::new(Gvk::secret(), "", "creds"))
            .unwrap();
        assert_eq!(
            secret.get(&FieldPath::parse("data.token")).and_then(Value::as_str),
            Some("c2VjcmV0")
        );
    }

    #[test]
    fn test_apply_secrets_reads_files() {
        let base = create_temp_dir();
        create_test_files(base.path(), &[("certs/tls.crt", "CERT")]);
        let secret = indoc! {r#"
            apiVersion: v1
            kind: Secret
            metadata:
              name: tls
            data:
              cert: ""
        "#};
        let mut spec = ModuleSpec::new("app");
        spec.secrets = vec!["@cert=certs/tls.crt".to_string()];
        let mut bundle = bundle_of(module_with(spec), &[secret]);

        bundle.apply_secrets(base.path()).unwrap();

        let tls = bundle
            .resources()
            .get(&ResId::new(Gvk::secret(), "", "tls"))
            .unwrap();
        assert_eq!(
            tls.get(&FieldPath::parse("data.cert")).and_then(Value::as_str),
            Some("Q0VSVA==")
        );
    }

    #[test]
    fn test_apply_secrets_missing_file_fails() {
        let mut spec = ModuleSpec::new("app");
        spec.secrets = vec!["@token=nope.txt".to_string()];
        let mut bundle = bundle_of(module_with(spec), &[SECRET]);

        let err = bundle.apply_secrets(&create_temp_dir().path().to_path_buf()).unwrap_err();
        assert!(matches!(err, BananaError::FileReadFailed { .. }));
    }

    #[test]
    fn test_assemble_end_to_end() {
        let source = create_temp_dir();
        create_test_files(
            source.path(),
            &[
                ("kustomization.yaml", "resources: [ingress.yaml, secret.yaml]\n"),
                ("ingress.yaml", INGRESS),
                ("secret.yaml", SECRET),
                (
                    "ha/kustomization.yaml",
                    "apiVersion: kustomize.config.k8s.io/v1alpha1\nkind: Component\ncommonLabels: { tier: ha }\n",
                ),
            ],
        );

        let mut spec = host_spec();
        spec.namespace = "test-namespace".to_string();
        spec.components = vec![crate::config::ComponentEntry::Name("ha".to_string())];
        spec.secrets = vec!["token=abc".to_string()];
        let module = module_with(spec);

        let options = BuildOptions::new(source.path());
        let bundle = assemble(
            &module,
            &DirFetcher(source.path().to_path_buf()),
            &KustomizeBuilder::default(),
            &options,
        )
        .unwrap();

        assert_eq!(bundle.composition().resources, vec!["web".to_string()]);
        assert_eq!(bundle.composition().components, vec!["web/ha".to_string()]);

        let ingress = bundle
            .resources()
            .get(&ResId::new(Gvk::ingress(), "test-namespace", "test-ingress"))
            .unwrap();
        assert_eq!(
            ingress.get(&FieldPath::parse("spec.rules[0].host")).and_then(Value::as_str),
            Some("infra-test-ingress")
        );
        assert_eq!(
            ingress.get(&FieldPath::parse("metadata.labels.tier")).and_then(Value::as_str),
            Some("ha")
        );

        let secret = bundle
            .resources()
            .get(&ResId::new(Gvk::secret(), "test-namespace", "creds"))
            .unwrap();
        assert_eq!(
            secret.get(&FieldPath::parse("data.token")).and_then(Value::as_str),
            Some("abc")
        );
    }

    #[test]
    fn test_assemble_renders_templates() {
        let source = create_temp_dir();
        create_test_files(
            source.path(),
            &[
                ("kustomization.yaml", "resources: [cm.yaml]\n"),
                (
                    "cm.yaml.tmpl",
                    "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: settings\ndata:\n  replicas: \"{{ .replicas }}\"\n",
                ),
            ],
        );
        let mut spec = ModuleSpec::new("app");
        spec.opts.vars.insert("replicas".to_string(), Value::from(3));
        let module = module_with(spec);

        let bundle = assemble(
            &module,
            &DirFetcher(source.path().to_path_buf()),
            &KustomizeBuilder::default(),
            &BuildOptions::new(source.path()),
        )
        .unwrap();

        let cm = bundle.resources().iter().next().unwrap();
        assert_eq!(
            cm.get(&FieldPath::parse("data.replicas")).and_then(Value::as_str),
            Some("3")
        );
    }

    #[test]
    fn test_assemble_wraps_fetch_failure() {
        let module = module_with(ModuleSpec::new("missing"));
        let err = assemble(
            &module,
            &FailingFetcher,
            &KustomizeBuilder::default(),
            &BuildOptions::new("/unused"),
        )
        .unwrap_err();

        match err {
            BananaError::ModuleFailed { module, stage, .. } => {
                assert_eq!(module, "missing");
                assert_eq!(stage, Stage::Fetch);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_assemble_wraps_compose_failure() {
        let source = create_temp_dir();
        create_test_files(source.path(), &[("README.md", "no kustomization here\n")]);
        let module = module_with(ModuleSpec::new("app"));

        let err = assemble(
            &module,
            &DirFetcher(source.path().to_path_buf()),
            &KustomizeBuilder::default(),
            &BuildOptions::new(source.path()),
        )
        .unwrap_err();

        assert!(matches!(err, BananaError::ModuleFailed { stage: Stage::Compose, .. }));
        assert!(matches!(err.root_cause(), BananaError::CompositionFailed { .. }));
    }
}
