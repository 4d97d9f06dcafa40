//! Vendor command implementation

use console::Style;

use crate::cli::VendorArgs;
use crate::commands::helpers::{absolute, load_manifest};
use crate::config::DEFAULT_ORIGIN;
use crate::error::Result;
use crate::fetch::SourceFetcher;
use crate::operations::VendorOperation;
use crate::progress::ProgressDisplay;

/// Run vendor command
pub fn run(args: VendorArgs, verbose: bool) -> Result<()> {
    let (manifest, base_dir) = load_manifest(&args.file)?;
    let default_origin = args.default_origin.as_deref().unwrap_or(DEFAULT_ORIGIN);
    let output = absolute(&args.output)?;

    let fetcher = SourceFetcher::new(&base_dir);
    let operation = VendorOperation::new(default_origin, &fetcher, args.force);

    let progress = if verbose {
        ProgressDisplay::hidden()
    } else {
        ProgressDisplay::new(manifest.modules.len() as u64)
    };
    let vendored = match operation.execute(&manifest, &output, &progress) {
        Ok(vendored) => vendored,
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };
    progress.finish();

    let green = Style::new().green().bold();
    for dir in &vendored {
        eprintln!("{} {}", green.apply_to("Vendored"), dir.display());
    }
    Ok(())
}
