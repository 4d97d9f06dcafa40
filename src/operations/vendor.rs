//! Vendor operation module
//!
//! This module provides VendorOperation struct that copies every module's sources into a
//! local directory without building them.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::BananaFile;
use crate::error::{BananaError, Result, Stage, StageContext};
use crate::fetch::Fetcher;
use crate::module::resolve;
use crate::progress::ProgressDisplay;

/// High-level vendor operation
pub struct VendorOperation<'a> {
    default_origin: &'a str,
    fetcher: &'a dyn Fetcher,
    force: bool,
}

impl<'a> VendorOperation<'a> {
    pub fn new(default_origin: &'a str, fetcher: &'a dyn Fetcher, force: bool) -> Self {
        Self {
            default_origin,
            fetcher,
            force,
        }
    }

    /// Fetch every module into `<out>/<display_name>`, returning the directories written
    pub fn execute(&self, manifest: &BananaFile, out: &Path, progress: &ProgressDisplay) -> Result<Vec<PathBuf>> {
        let mut vendored = Vec::with_capacity(manifest.modules.len());

        for spec in &manifest.modules {
            progress.update_module(&spec.name, "resolve");
            let module = resolve(spec, self.default_origin).stage(&spec.name, Stage::Resolve)?;
            let name = module.display_name.as_str();
            let dest = out.join(name);

            self.prepare(&dest).stage(name, Stage::Fetch)?;

            progress.update_module(name, "fetch");
            self.fetcher
                .fetch(&module.origin, &module.reference, &module.subdirectory, &dest)
                .stage(name, Stage::Fetch)?;

            info!(module = name, reference = %module.reference, dest = %dest.display(), "vendored");
            vendored.push(dest);
            progress.inc_module();
        }

        Ok(vendored)
    }

    /// Clear a previously vendored module, or refuse to overwrite it
    fn prepare(&self, dest: &Path) -> Result<()> {
        if !dest.exists() {
            return Ok(());
        }
        if !self.force {
            return Err(BananaError::ExportFailed {
                path: dest.display().to_string(),
                reason: "module was already vendored, use --force to replace it".to_string(),
            });
        }
        fs::remove_dir_all(dest).map_err(|e| BananaError::IoError {
            message: format!("failed to remove {}: {e}", dest.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::SourceFetcher;
    use crate::test_fixtures::{create_temp_dir, create_test_files};

    fn vendor(base: &Path, manifest: &str, force: bool) -> Result<Vec<PathBuf>> {
        let manifest = BananaFile::from_yaml(manifest).unwrap();
        let fetcher = SourceFetcher::new(base);
        VendorOperation::new("modules", &fetcher, force).execute(
            &manifest,
            &base.join("src"),
            &ProgressDisplay::hidden(),
        )
    }

    #[test]
    fn test_vendor_copies_sources_untouched() {
        let temp = create_temp_dir();
        create_test_files(
            temp.path(),
            &[
                ("modules/web/nginx/kustomization.yaml", "resources: []\n"),
                ("modules/web/nginx/values.yaml.tmpl", "x: {{ .x }}\n"),
            ],
        );

        let vendored = vendor(temp.path(), "modules:\n  - name: web/nginx\n", false).unwrap();

        assert_eq!(vendored, vec![temp.path().join("src/web/nginx")]);
        assert!(temp.path().join("src/web/nginx/kustomization.yaml").is_file());
        assert!(temp.path().join("src/web/nginx/values.yaml.tmpl").is_file());
    }

    #[test]
    fn test_vendor_refuses_to_overwrite_without_force() {
        let temp = create_temp_dir();
        create_test_files(
            temp.path(),
            &[
                ("modules/app/kustomization.yaml", "resources: []\n"),
                ("src/app/stale.yaml", "old: true\n"),
            ],
        );

        let err = vendor(temp.path(), "modules:\n  - name: app\n", false).unwrap_err();
        assert!(matches!(err.root_cause(), BananaError::ExportFailed { .. }));

        vendor(temp.path(), "modules:\n  - name: app\n", true).unwrap();
        assert!(!temp.path().join("src/app/stale.yaml").exists());
        assert!(temp.path().join("src/app/kustomization.yaml").is_file());
    }
}
