//! Command helper utilities

use std::path::{Path, PathBuf};

use crate::config::BananaFile;
use crate::error::{BananaError, Result};

/// Make a path absolute against the current directory
pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| BananaError::IoError {
        message: format!("Failed to get current directory: {e}"),
    })?;
    Ok(cwd.join(path))
}

/// Load a manifest, returning it with the directory relative paths resolve against
pub fn load_manifest(file: &Path) -> Result<(BananaFile, PathBuf)> {
    let file = absolute(file)?;
    let manifest = BananaFile::load(&file)?;
    let base_dir = file
        .parent()
        .map_or_else(|| PathBuf::from("/"), Path::to_path_buf);
    Ok((manifest, base_dir))
}
