//! Common test utilities for Banana integration tests

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A directory holding a manifest and a local module catalog
pub struct TestWorkspace {
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Path to workspace root
    pub path: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().to_path_buf();
        Self { temp, path }
    }

    /// Write a file in workspace
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from workspace
    #[allow(dead_code)]
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    #[allow(dead_code)]
    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Write `banana.yaml` with the given modules block
    #[allow(dead_code)]
    pub fn write_manifest(&self, modules: &str) {
        self.write_file(
            "banana.yaml",
            &format!("apiVersion: banana.io/v1alpha1\nkind: Banana\nname: test\nmodules:\n{modules}"),
        );
    }

    /// Write a module below the default `modules/` origin
    #[allow(dead_code)]
    pub fn write_module(&self, name: &str, files: &[(&str, &str)]) {
        for (file, content) in files {
            self.write_file(&format!("modules/{name}/{file}"), content);
        }
    }

    /// Command running the banana binary inside the workspace
    pub fn banana(&self) -> Command {
        let mut cmd = banana_cmd();
        cmd.current_dir(&self.path)
            .env_remove("BANANA_RECIPIENTS")
            .env_remove("BANANA_DEFAULT_ORIGIN")
            .env_remove("BANANA_IDENTITY")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[allow(deprecated)]
pub fn banana_cmd() -> Command {
    Command::cargo_bin("banana").unwrap()
}

/// Generate a keypair with the binary, returning (identity, recipient)
#[allow(dead_code)]
pub fn keygen(dir: &Path) -> (String, String) {
    let output = banana_cmd()
        .current_dir(dir)
        .arg("keygen")
        .output()
        .expect("Failed to run keygen");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    let recipient = lines
        .next()
        .and_then(|line| line.strip_prefix("# recipient: "))
        .expect("Missing recipient line")
        .to_string();
    let identity = lines.next().expect("Missing identity line").to_string();
    (identity, recipient)
}

/// An ingress, a Secret declaring `token` and a Service
#[allow(dead_code)]
pub const WEB_MODULE: &[(&str, &str)] = &[
    (
        "kustomization.yaml",
        "resources:\n  - ingress.yaml\n  - secret.yaml\n  - service.yaml\n",
    ),
    (
        "ingress.yaml",
        "apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: test-ingress
spec:
  rules:
    - host: placeholder
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: web
                port:
                  number: 80
",
    ),
    (
        "secret.yaml",
        "apiVersion: v1
kind: Secret
metadata:
  name: creds
type: Opaque
data:
  token: \"\"
",
    ),
    (
        "service.yaml",
        "apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  ports:
    - port: 80
",
    ),
];
