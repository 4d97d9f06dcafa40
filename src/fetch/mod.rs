//! Module retrieval
//!
//! A [`Fetcher`] populates a destination directory with a module's sources. The
//! [`SourceFetcher`] copies plain directories and retrieves git origins through
//! [`crate::git::fetch_reference`].

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::common::fs::{CopyOptions, copy_dir_recursive};
use crate::error::{BananaError, Result};
use crate::git::{self, url::file_url_path};
use crate::temp;

/// Retrieves module sources into a destination directory
pub trait Fetcher {
    /// Populate `dest` with `<origin>/<subdirectory>` at `reference`
    fn fetch(&self, origin: &str, reference: &str, subdirectory: &str, dest: &Path) -> Result<()>;
}

/// Fetches from local directories and git remotes
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    /// Directory relative local origins are resolved against
    base_dir: PathBuf,
}

impl SourceFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn local_root(&self, origin: &str) -> PathBuf {
        let path = file_url_path(origin).unwrap_or_else(|| PathBuf::from(origin));
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    fn fetch_local(&self, origin: &str, subdirectory: &str, dest: &Path) -> Result<()> {
        let source = module_source(&self.local_root(origin), subdirectory)?;
        debug!(source = %source.display(), "copying local module");
        copy_module(&source, dest)
    }

    fn fetch_git(origin: &str, reference: &str, subdirectory: &str, dest: &Path) -> Result<()> {
        check_subdirectory(subdirectory)?;
        let checkout = temp::work_dir("banana-git-")?;
        let commit = git::fetch_reference(origin, reference, checkout.path())?;
        info!(origin, reference, commit = %commit, "fetched");
        copy_module(&checkout.path().join(subdirectory), dest)
    }
}

impl Fetcher for SourceFetcher {
    fn fetch(&self, origin: &str, reference: &str, subdirectory: &str, dest: &Path) -> Result<()> {
        if git::is_git_origin(origin) {
            Self::fetch_git(origin, reference, subdirectory, dest)
        } else {
            self.fetch_local(origin, subdirectory, dest)
        }
    }
}

/// A subdirectory must stay inside its origin
fn check_subdirectory(subdirectory: &str) -> Result<()> {
    let escapes = Path::new(subdirectory).is_absolute()
        || subdirectory
            .split(['/', '\\'])
            .any(|segment| segment == "..");
    if escapes {
        return Err(BananaError::ConfigInvalid {
            message: format!("module subdirectory '{subdirectory}' must stay inside its origin"),
        });
    }
    Ok(())
}

fn module_source(root: &Path, subdirectory: &str) -> Result<PathBuf> {
    check_subdirectory(subdirectory)?;
    Ok(root.join(subdirectory))
}

fn copy_module(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(BananaError::ModuleNotFound {
            path: source.display().to_string(),
        });
    }
    copy_dir_recursive(source, dest, &CopyOptions::exclude_git()).map_err(|e| BananaError::IoError {
        message: format!("failed to copy {} to {}: {e}", source.display(), dest.display()),
    })
}
