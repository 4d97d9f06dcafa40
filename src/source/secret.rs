//! Secret token parsing
//!
//! Tokens are written as `key=value`, or `@key=path` when the value lives in a file.
//! Parsing never touches the filesystem; file values are read by the bundle assembler.

use std::fmt;

use crate::error::{BananaError, Result};

const FILE_MARKER: char = '@';

/// A declared secret for a module
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    /// Key as written, including the `@` file marker
    pub key: String,
    /// Literal value, or a path when `is_file` is set
    pub value: String,
    pub is_file: bool,
}

impl Secret {
    /// Parse a `key=value` token, splitting on the first `=`
    pub fn parse(token: &str) -> Result<Self> {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| BananaError::InvalidSecret {
                token: redact(token),
                reason: "missing '=' between key and value".to_string(),
            })?;

        if key.trim_start_matches(FILE_MARKER).is_empty() {
            return Err(BananaError::InvalidSecret {
                token: redact(token),
                reason: "empty key".to_string(),
            });
        }

        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
            is_file: key.starts_with(FILE_MARKER),
        })
    }

    /// Name of the entry inside a Secret resource's `data`
    pub fn data_key(&self) -> &str {
        self.key.strip_prefix(FILE_MARKER).unwrap_or(&self.key)
    }
}

// Values never end up in logs or error output
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("key", &self.key)
            .field("value", &if self.is_file { self.value.as_str() } else { "***" })
            .field("is_file", &self.is_file)
            .finish()
    }
}

fn redact(token: &str) -> String {
    match token.split_once('=') {
        Some((key, _)) => format!("{key}=***"),
        None => format!("{}***", token.chars().take(4).collect::<String>()),
    }
}
