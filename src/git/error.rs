//! Git error interpretation
//!
//! libgit2 messages are terse and transport specific; this maps them onto a short list of
//! reasons a user can act on.

use git2::{Error, ErrorClass, ErrorCode};

/// Reason categories, checked in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reason {
    NotFound,
    Authentication,
    PermissionDenied,
    Network,
    Certificate,
}

impl Reason {
    fn describe(self) -> &'static str {
        match self {
            Reason::NotFound => "Repository not found",
            Reason::Authentication => "Authentication failed",
            Reason::PermissionDenied => "Permission denied",
            Reason::Network => "Network error",
            Reason::Certificate => "TLS certificate error",
        }
    }
}

fn classify(message: &str, class: ErrorClass, code: ErrorCode) -> Option<Reason> {
    let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if code == ErrorCode::NotFound
        || has(&["not found", "404", "does not appear to be a git repository"])
    {
        Some(Reason::NotFound)
    } else if code == ErrorCode::Auth || has(&["authentication", "credentials"]) {
        Some(Reason::Authentication)
    } else if has(&["permission denied", "access denied", "403"]) {
        Some(Reason::PermissionDenied)
    } else if code == ErrorCode::Certificate
        || (matches!(class, ErrorClass::Http | ErrorClass::Ssl) && has(&["certificate", "ssl"]))
    {
        Some(Reason::Certificate)
    } else if matches!(class, ErrorClass::Net) || has(&["connection", "timed out", "timeout", "resolve host"]) {
        Some(Reason::Network)
    } else {
        None
    }
}

/// Interpret a git2 error into a user-facing reason
pub fn interpret_git_error(err: &Error) -> String {
    let message = err.message().to_lowercase();
    match classify(&message, err.class(), err.code()) {
        Some(reason) => format!("{}: {}", reason.describe(), err.message()),
        None => match err.class() {
            ErrorClass::Http => format!("HTTP error: {}", err.message()),
            ErrorClass::Ssh => format!("SSH error: {}", err.message()),
            _ => err.message().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(code: ErrorCode, class: ErrorClass, message: &str) -> Error {
        Error::new(code, class, message)
    }

    #[test]
    fn test_not_found() {
        let err = error(ErrorCode::GenericError, ErrorClass::Http, "unexpected http status code: 404");
        assert!(interpret_git_error(&err).starts_with("Repository not found"));
    }

    #[test]
    fn test_authentication() {
        let err = error(ErrorCode::Auth, ErrorClass::Ssh, "no auth sock variable");
        assert!(interpret_git_error(&err).starts_with("Authentication failed"));
    }

    #[test]
    fn test_network() {
        let err = error(ErrorCode::GenericError, ErrorClass::Net, "failed to resolve address");
        assert!(interpret_git_error(&err).starts_with("Network error"));
    }

    #[test]
    fn test_other_http_error_keeps_message() {
        let err = error(ErrorCode::GenericError, ErrorClass::Http, "unexpected content-type");
        assert_eq!(interpret_git_error(&err), "HTTP error: unexpected content-type");
    }

    #[test]
    fn test_plain_error_passthrough() {
        let err = error(ErrorCode::GenericError, ErrorClass::Reference, "invalid refspec");
        assert_eq!(interpret_git_error(&err), "invalid refspec");
    }
}
