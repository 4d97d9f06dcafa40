//! Build operation module
//!
//! This module provides BuildOperation struct that runs the full pipeline for a manifest.

use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::builder::Builder;
use crate::bundle::assemble;
use crate::config::{BananaFile, BuildOptions};
use crate::crypto::Encryptor;
use crate::error::{BananaError, Result, Stage, StageContext};
use crate::fetch::Fetcher;
use crate::module::resolve;
use crate::progress::ProgressDisplay;

/// Where built modules go
pub enum BuildTarget<'w> {
    /// One directory per module below this path
    Directory(PathBuf),
    /// A single multi-document YAML stream
    Stream(&'w mut dyn Write),
}

/// What a build produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub modules: usize,
    pub resources: usize,
    /// Files written, empty for stream output
    pub written: Vec<PathBuf>,
}

/// High-level build operation
pub struct BuildOperation<'a> {
    options: &'a BuildOptions,
    fetcher: &'a dyn Fetcher,
    builder: &'a dyn Builder,
    encryptor: &'a dyn Encryptor,
}

impl<'a> BuildOperation<'a> {
    pub fn new(
        options: &'a BuildOptions,
        fetcher: &'a dyn Fetcher,
        builder: &'a dyn Builder,
        encryptor: &'a dyn Encryptor,
    ) -> Self {
        Self {
            options,
            fetcher,
            builder,
            encryptor,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        self.options
    }

    /// Execute the build for every module of the manifest, in order
    pub fn execute(
        &self,
        manifest: &BananaFile,
        mut target: BuildTarget<'_>,
        progress: &ProgressDisplay,
    ) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();

        for spec in &manifest.modules {
            progress.update_module(&spec.name, "resolve");
            let module = resolve(spec, &self.options.default_origin).stage(&spec.name, Stage::Resolve)?;
            let name = module.display_name.clone();

            progress.update_module(&name, "assemble");
            let bundle = assemble(&module, self.fetcher, self.builder, self.options)?;
            let resources = bundle.resources().len();

            progress.update_module(&name, "export");
            match &mut target {
                BuildTarget::Directory(dir) => {
                    let written = bundle
                        .export(dir, &self.options.export, self.encryptor)
                        .stage(&name, Stage::Export)?;
                    summary.written.extend(written);
                }
                BuildTarget::Stream(writer) => {
                    if resources > 0 {
                        if summary.resources > 0 {
                            writer
                                .write_all(b"---\n")
                                .map_err(|e| BananaError::ExportFailed {
                                    path: name.clone(),
                                    reason: e.to_string(),
                                })
                                .stage(&name, Stage::Export)?;
                        }
                        bundle
                            .flatten(&mut **writer, &self.options.export, self.encryptor)
                            .stage(&name, Stage::Export)?;
                    }
                }
            }

            info!(module = %name, resources, "built");
            summary.modules += 1;
            summary.resources += resources;
            progress.inc_module();
        }

        Ok(summary)
    }
}
