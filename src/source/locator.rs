//! Module source string parsing
//!
//! Splits a module source into the origin to fetch, the subdirectory inside it and an
//! optional embedded reference. Supported forms:
//! - `https://host/org/repo.git//path/in/repo?ref=v1`
//! - `ssh://git@host/org/repo.git//path`, `git@host:org/repo.git//path`
//! - `file:///abs/repo//path?ref=main`
//! - anything without a scheme is a local path and is returned untouched

use crate::error::{BananaError, Result};

/// Marker separating the origin from the subdirectory inside it
const SUBDIR_MARKER: &str = "//";

/// A parsed module source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    /// Bare origin, subdirectory marker and query stripped
    pub origin: String,
    /// Path inside the origin, empty when the whole origin is the module
    pub subdirectory: String,
    /// Value of the `ref` query parameter, if present
    pub embedded_ref: Option<String>,
}

impl Located {
    fn local(source: &str) -> Self {
        Self {
            origin: source.to_string(),
            subdirectory: String::new(),
            embedded_ref: None,
        }
    }

    /// Whether the source named a remote origin
    pub fn is_remote(&self) -> bool {
        is_remote_source(&self.origin)
    }
}

/// Check whether a source string carries a scheme (or SCP-style SSH form)
pub fn is_remote_source(source: &str) -> bool {
    source.contains("://") || is_scp_style(source)
}

/// SCP-style SSH sources look like `git@host:org/repo`
fn is_scp_style(source: &str) -> bool {
    if source.contains("://") {
        return false;
    }
    match (source.find('@'), source.find(':')) {
        (Some(at), Some(colon)) => at > 0 && colon > at + 1,
        _ => false,
    }
}

/// Parse a module source string
pub fn locate(source: &str) -> Result<Located> {
    if !is_remote_source(source) {
        return Ok(Located::local(source));
    }

    if source.chars().any(char::is_whitespace) {
        return Err(parse_error(source, "source contains whitespace"));
    }

    let (main_part, query) = match source.split_once('?') {
        Some((main, query)) => (main, Some(query)),
        None => (source, None),
    };

    // Everything up to and including the scheme/host separator is never searched for `//`
    let prefix_len = if is_scp_style(main_part) {
        scp_prefix_len(source, main_part)?
    } else {
        scheme_prefix_len(source, main_part)?
    };

    let (prefix, path_part) = main_part.split_at(prefix_len);
    let (origin, subdirectory) = match path_part.find(SUBDIR_MARKER) {
        Some(pos) => (
            format!("{prefix}{}", &path_part[..pos]),
            path_part[pos + SUBDIR_MARKER.len()..].to_string(),
        ),
        None => (main_part.to_string(), String::new()),
    };

    Ok(Located {
        origin,
        subdirectory,
        embedded_ref: query.and_then(ref_from_query),
    })
}

/// Length of `scheme://host` for URL-style sources, validating both parts
fn scheme_prefix_len(source: &str, main_part: &str) -> Result<usize> {
    let scheme_end = main_part
        .find("://")
        .ok_or_else(|| parse_error(source, "missing scheme separator"))?;
    let scheme = &main_part[..scheme_end];

    if scheme.is_empty() {
        return Err(parse_error(source, "empty scheme"));
    }
    let valid_scheme = scheme.chars().enumerate().all(|(i, c)| {
        if i == 0 {
            c.is_ascii_alphabetic()
        } else {
            c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
        }
    });
    if !valid_scheme {
        return Err(parse_error(
            source,
            &format!("invalid characters in scheme '{scheme}'"),
        ));
    }

    let after_scheme = scheme_end + "://".len();
    let host = main_part[after_scheme..]
        .split('/')
        .next()
        .unwrap_or_default();
    if host.is_empty() && !scheme.eq_ignore_ascii_case("file") {
        return Err(parse_error(source, "empty host"));
    }

    Ok(after_scheme + host.len())
}

/// Length of `user@host:` for SCP-style sources
fn scp_prefix_len(source: &str, main_part: &str) -> Result<usize> {
    let colon = main_part
        .find(':')
        .ok_or_else(|| parse_error(source, "missing ':' after host"))?;
    let host = main_part[..colon]
        .split_once('@')
        .map(|(_, host)| host)
        .unwrap_or_default();
    if host.is_empty() {
        return Err(parse_error(source, "empty host"));
    }
    Ok(colon + 1)
}

/// Only the `ref` query parameter is meaningful; everything else is dropped
fn ref_from_query(query: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "ref")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn parse_error(source: &str, reason: &str) -> BananaError {
    BananaError::SourceParseFailed {
        input: source.to_string(),
        reason: reason.to_string(),
    }
}
