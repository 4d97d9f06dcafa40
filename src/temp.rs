//! Safe temporary directory base so module work dirs are never created under the current
//! working directory (e.g. when TMPDIR=tmp or TMPDIR=./tmp).

use std::env;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::error::{BananaError, Result};

/// Returns a directory path suitable for creating temporary directories.
/// Never returns a relative path, so a build never drops temp dirs into the manifest directory.
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// Create a fresh work directory, removed when the returned handle drops
pub fn work_dir(prefix: &str) -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(temp_dir_base())
        .map_err(|e| BananaError::IoError {
            message: format!("failed to create temporary directory: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_base_is_absolute() {
        assert!(temp_dir_base().is_absolute());
    }

    #[test]
    fn test_work_dir_is_removed_on_drop() {
        let dir = work_dir("banana-test-").unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        assert!(
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("banana-test-"))
        );
        drop(dir);
        assert!(!path.exists());
    }
}
