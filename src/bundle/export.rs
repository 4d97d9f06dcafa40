//! Writing bundles out
//!
//! Secrets are routed through the [`Encryptor`] when recipients are configured and the
//! module declares secrets; every other resource is written as plain YAML.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::Bundle;
use crate::builder::Kustomization;
use crate::config::ExportOptions;
use crate::crypto::Encryptor;
use crate::error::{BananaError, Result};
use crate::resource::{Gvk, Resource};

const DOCUMENT_SEPARATOR: &str = "---\n";

impl Bundle {
    /// Write one file per resource plus a `kustomization.yaml` listing them
    ///
    /// Files land in `<target>/<root_dir>/<display_name>/`. The first failing resource
    /// aborts the export; files already written are left in place.
    pub fn export(
        self,
        target: &Path,
        options: &ExportOptions,
        encryptor: &dyn Encryptor,
    ) -> Result<Vec<PathBuf>> {
        let dir = self.export_dir(target, options);
        fs::create_dir_all(&dir).map_err(|e| BananaError::ExportFailed {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut written = Vec::with_capacity(self.resources.len() + 1);
        let mut names = HashSet::new();
        let mut index = Kustomization {
            namespace: self.module.namespace.clone(),
            ..Kustomization::new()
        };

        for resource in self.resources.iter() {
            let file_name = resource.file_name();
            if !names.insert(file_name.clone()) {
                return Err(BananaError::ExportFailed {
                    path: dir.join(&file_name).display().to_string(),
                    reason: format!("{} would overwrite another resource's file", resource.id()),
                });
            }

            let content = self.render(resource, options, encryptor)?;
            let path = dir.join(&file_name);
            fs::write(&path, content).map_err(|e| BananaError::FileWriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            debug!(path = %path.display(), "wrote resource");

            index.resources.push(file_name);
            written.push(path);
        }

        written.push(index.write(&dir)?);
        info!(
            module = %self.module.display_name,
            dir = %dir.display(),
            files = written.len(),
            "exported"
        );
        Ok(written)
    }

    /// Write every resource to `writer` as one multi-document YAML stream
    pub fn flatten(
        self,
        writer: &mut dyn Write,
        options: &ExportOptions,
        encryptor: &dyn Encryptor,
    ) -> Result<()> {
        let docs = self
            .resources
            .iter()
            .map(|resource| self.render(resource, options, encryptor))
            .collect::<Result<Vec<_>>>()?;

        let stream = docs
            .iter()
            .map(|doc| String::from_utf8_lossy(doc))
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);
        writer
            .write_all(stream.as_bytes())
            .map_err(|e| BananaError::ExportFailed {
                path: self.module.display_name.clone(),
                reason: e.to_string(),
            })
    }

    fn export_dir(&self, target: &Path, options: &ExportOptions) -> PathBuf {
        let mut dir = target.to_path_buf();
        if let Some(root_dir) = &options.root_dir {
            dir.push(root_dir);
        }
        dir.join(&self.module.display_name)
    }

    /// Whether a resource goes through the encryptor
    fn should_encrypt(&self, resource: &Resource, options: &ExportOptions) -> bool {
        resource.gvk() == Gvk::secret()
            && !options.recipients.is_empty()
            && !self.module.secrets.is_empty()
    }

    fn render(
        &self,
        resource: &Resource,
        options: &ExportOptions,
        encryptor: &dyn Encryptor,
    ) -> Result<Vec<u8>> {
        let plain = resource.to_yaml()?.into_bytes();
        if !self.should_encrypt(resource, options) {
            return Ok(plain);
        }

        debug!(resource = %resource.id(), "encrypting");
        encryptor.encrypt(&plain, &options.recipients, &self.module.secret_keys())
    }
}
