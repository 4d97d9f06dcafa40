//! Library-level pipeline tests with the concrete fetcher, builder and encryptor

use std::fs;
use std::path::Path;

use banana::builder::KustomizeBuilder;
use banana::config::{BananaFile, BuildOptions};
use banana::crypto::{EnvelopeEncryptor, decrypt_stream, generate_identity};
use banana::error::{BananaError, Stage};
use banana::fetch::SourceFetcher;
use banana::operations::{BuildOperation, BuildTarget};
use banana::progress::ProgressDisplay;
use indoc::indoc;
use tempfile::TempDir;

const MANIFEST: &str = indoc! {r#"
    apiVersion: banana.io/v1alpha1
    kind: Banana
    modules:
      - name: apps/web
        namespace: test-namespace
        components: [ha]
        host:
          prefix: infra
          wildcard: example.com
        secrets:
          - token=abc
          - "@cert=certs/tls.crt"
        opts:
          vars:
            replicas: 3
"#};

fn write(root: &Path, path: &str, content: &str) {
    let file = root.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(
        root,
        "modules/apps/web/kustomization.yaml",
        "resources: [ingress.yaml, secret.yaml, deployment.yaml]\n",
    );
    write(
        root,
        "modules/apps/web/ingress.yaml",
        indoc! {r#"
            apiVersion: networking.k8s.io/v1
            kind: Ingress
            metadata:
              name: test-ingress
        "#},
    );
    write(
        root,
        "modules/apps/web/secret.yaml",
        indoc! {r#"
            apiVersion: v1
            kind: Secret
            metadata:
              name: creds
            data:
              token: ""
              cert: ""
        "#},
    );
    write(
        root,
        "modules/apps/web/deployment.yaml.tmpl",
        indoc! {r#"
            apiVersion: apps/v1
            kind: Deployment
            metadata:
              name: web
            spec:
              replicas: {{ .replicas }}
        "#},
    );
    write(
        root,
        "modules/apps/web/ha/kustomization.yaml",
        "apiVersion: kustomize.config.k8s.io/v1alpha1\nkind: Component\ncommonLabels:\n  tier: ha\n",
    );
    write(root, "certs/tls.crt", "CERT");
    temp
}

fn run(root: &Path, options: &BuildOptions, target: BuildTarget<'_>) -> banana::error::Result<usize> {
    let manifest = BananaFile::from_yaml(MANIFEST).unwrap();
    let fetcher = SourceFetcher::new(root);
    let builder = KustomizeBuilder::new(options.builder.clone());
    let operation = BuildOperation::new(options, &fetcher, &builder, &EnvelopeEncryptor);
    operation
        .execute(&manifest, target, &ProgressDisplay::hidden())
        .map(|summary| summary.resources)
}

#[test]
fn test_pipeline_exports_patched_module() {
    let temp = workspace();
    let out = temp.path().join("out");
    let options = BuildOptions::new(temp.path());

    let resources = run(temp.path(), &options, BuildTarget::Directory(out.clone())).unwrap();
    assert_eq!(resources, 3);

    let dir = out.join("apps/web");
    let ingress = fs::read_to_string(dir.join("ingress_test-ingress.yaml")).unwrap();
    assert!(ingress.contains("host: infra-test-ingress.example.com"));
    assert!(ingress.contains("namespace: test-namespace"));
    assert!(ingress.contains("tier: ha"));

    let secret = fs::read_to_string(dir.join("secret_creds.yaml")).unwrap();
    assert!(secret.contains("token: abc"));
    // base64("CERT")
    assert!(secret.contains("cert: Q0VSVA=="));

    let deployment = fs::read_to_string(dir.join("deployment_web.yaml")).unwrap();
    assert!(deployment.contains("replicas: 3"));
}

#[test]
fn test_pipeline_stream_encrypts_secrets() {
    let temp = workspace();
    let (identity, recipient) = generate_identity();
    let options = BuildOptions::new(temp.path()).with_recipients(vec![recipient.to_base64()]);

    let mut stream = Vec::new();
    run(temp.path(), &options, BuildTarget::Stream(&mut stream)).unwrap();
    let stream = String::from_utf8(stream).unwrap();

    assert!(stream.contains("ENC[XCHACHA20_POLY1305"));
    assert!(!stream.contains("token: abc"));
    assert!(stream.contains("host: infra-test-ingress.example.com"));

    let plain = decrypt_stream(&stream, &identity).unwrap();
    assert!(plain.contains("token: abc"));
    assert!(plain.contains("kind: Deployment"));
    assert!(!plain.contains("ENC["));
}

#[test]
fn test_pipeline_reports_failing_stage() {
    let temp = workspace();
    fs::remove_file(temp.path().join("certs/tls.crt")).unwrap();
    let options = BuildOptions::new(temp.path());

    let err = run(temp.path(), &options, BuildTarget::Directory(temp.path().join("out"))).unwrap_err();
    match err {
        BananaError::ModuleFailed { module, stage, .. } => {
            assert_eq!(module, "apps/web");
            assert_eq!(stage, Stage::Patch);
        }
        other => panic!("Expected ModuleFailed, got {other:?}"),
    }
}
