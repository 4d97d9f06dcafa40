//! Init command implementation

use std::fs;
use std::path::Path;

use console::Style;

use crate::cli::InitArgs;
use crate::commands::helpers::absolute;
use crate::config::BananaFile;
use crate::error::{BananaError, Result};

const EXAMPLE: &str = "\
# modules:
#   - name: monitoring/prometheus          # local module below the default origin
#     namespace: monitoring
#     components: [ha]
#     host: { prefix: infra, wildcard: example.com }
#     secrets: [\"token=abc\", \"@cert=certs/tls.crt\"]
#   - name: https://github.com/org/mods.git//ingress/nginx?ref=main
#     version: v1.2.0
";

/// Run init command
pub fn run(args: InitArgs) -> Result<()> {
    let path = absolute(&args.file)?;
    let name = args.name.unwrap_or_else(|| default_name(&path));
    write_skeleton(&path, &name)?;

    let green = Style::new().green().bold();
    eprintln!("{} {}", green.apply_to("Created"), path.display());
    Ok(())
}

/// Write an empty manifest with a commented example, never replacing an existing file
fn write_skeleton(path: &Path, name: &str) -> Result<()> {
    if path.exists() {
        return Err(BananaError::ConfigAlreadyExists {
            path: path.display().to_string(),
        });
    }

    let mut content = BananaFile::new(name).to_yaml()?;
    content.push_str(EXAMPLE);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).map_err(|e| BananaError::FileWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Name of the directory the manifest lives in
fn default_name(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .unwrap_or("cluster")
        .to_string()
}
