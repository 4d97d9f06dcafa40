//! Build command implementation
//!
//! The build process:
//! 1. Load the manifest and derive the build options from the arguments
//! 2. Check recipient keys before any module is fetched
//! 3. Resolve, fetch, compose, patch and export every module in manifest order
//! 4. Write one directory per module, or a YAML stream to stdout

use std::io::Write;

use console::Style;

use crate::builder::KustomizeBuilder;
use crate::cli::BuildArgs;
use crate::commands::helpers::load_manifest;
use crate::config::{BuildOptions, BuilderOptions, LoadRestrictions, Reorder};
use crate::crypto::{EnvelopeEncryptor, Recipient};
use crate::error::{BananaError, Result};
use crate::fetch::SourceFetcher;
use crate::operations::{BuildOperation, BuildTarget};
use crate::progress::ProgressDisplay;

/// Run build command
pub fn run(args: BuildArgs, verbose: bool) -> Result<()> {
    let (manifest, base_dir) = load_manifest(&args.file)?;
    let options = build_options(&args, &base_dir);

    for recipient in &options.export.recipients {
        Recipient::parse(recipient)?;
    }

    let fetcher = SourceFetcher::new(&options.base_dir);
    let builder = KustomizeBuilder::new(options.builder.clone());
    let operation = BuildOperation::new(&options, &fetcher, &builder, &EnvelopeEncryptor);

    let Some(output) = args.output else {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        operation.execute(&manifest, BuildTarget::Stream(&mut lock), &ProgressDisplay::hidden())?;
        return lock.flush().map_err(BananaError::from);
    };

    let progress = if verbose {
        ProgressDisplay::hidden()
    } else {
        ProgressDisplay::new(manifest.modules.len() as u64)
    };
    let summary = match operation.execute(&manifest, BuildTarget::Directory(output.clone()), &progress) {
        Ok(summary) => summary,
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };
    progress.finish();

    let green = Style::new().green().bold();
    eprintln!(
        "{} {} module(s), {} resource(s) into {}",
        green.apply_to("Built"),
        summary.modules,
        summary.resources,
        output.display()
    );
    Ok(())
}

fn build_options(args: &BuildArgs, base_dir: &std::path::Path) -> BuildOptions {
    let mut options = BuildOptions::new(base_dir)
        .with_recipients(args.recipients.clone())
        .with_root_dir(args.root_dir.clone());
    if let Some(origin) = &args.default_origin {
        options = options.with_default_origin(origin.clone());
    }
    options.builder = BuilderOptions {
        reorder: if args.reorder {
            Reorder::Legacy
        } else {
            Reorder::None
        },
        add_managed_by_label: args.managed_by_label,
        load_restrictions: if args.no_load_restrictions {
            LoadRestrictions::None
        } else {
            LoadRestrictions::RootOnly
        },
    };
    options
}
