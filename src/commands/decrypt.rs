//! Decrypt command implementation

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::cli::DecryptArgs;
use crate::crypto::{Identity, decrypt_stream};
use crate::error::{BananaError, Result};

/// Run decrypt command
pub fn run(args: DecryptArgs) -> Result<()> {
    let identity = Identity::parse(&args.identity)?;
    let plain = decrypt_file(&args.file, &identity)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(plain.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn decrypt_file(path: &Path, identity: &Identity) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| BananaError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    decrypt_stream(&content, identity)
}
