//! Error types and handling for Banana
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Pipeline stage a module failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Fetch,
    Compose,
    Patch,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolve => "resolve",
            Stage::Fetch => "fetch",
            Stage::Compose => "compose",
            Stage::Patch => "patch",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// Main error type for Banana operations
#[derive(Error, Diagnostic, Debug)]
pub enum BananaError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(banana::config::not_found),
        help("Run 'banana init' to create a manifest or pass one with -f")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(banana::config::parse_failed), help("{reason}"))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(banana::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Configuration file already exists: {path}")]
    #[diagnostic(
        code(banana::config::already_exists),
        help("Edit the existing file or pass another path with -f")
    )]
    ConfigAlreadyExists { path: String },

    #[error("Invalid secret '{token}': {reason}")]
    #[diagnostic(
        code(banana::config::invalid_secret),
        help("Secrets are written as key=value, or @key=path to read the value from a file")
    )]
    InvalidSecret { token: String, reason: String },

    #[error("Failed to parse source: {input}")]
    #[diagnostic(code(banana::source::parse_failed), help("{reason}"))]
    SourceParseFailed { input: String, reason: String },

    // Retrieval errors
    #[error("Module not found: {path}")]
    #[diagnostic(
        code(banana::module::not_found),
        help("Check the module name and the default origin (--default-origin)")
    )]
    ModuleNotFound { path: String },

    #[error("Failed to clone repository: {url}")]
    #[diagnostic(
        code(banana::git::clone_failed),
        help("Check that URL is correct and you have access to the repository")
    )]
    GitCloneFailed { url: String, reason: String },

    #[error("Failed to fetch from remote: {reason}")]
    #[diagnostic(code(banana::git::fetch_failed))]
    GitFetchFailed { reason: String },

    #[error("Failed to resolve git ref '{git_ref}': {reason}")]
    #[diagnostic(code(banana::git::ref_resolve_failed))]
    GitRefResolveFailed { git_ref: String, reason: String },

    #[error("Failed to checkout commit '{sha}': {reason}")]
    #[diagnostic(code(banana::git::checkout_failed))]
    GitCheckoutFailed { sha: String, reason: String },

    #[error("Git operation failed: {message}")]
    #[diagnostic(code(banana::git::operation_failed))]
    GitOperationFailed { message: String },

    // Composition errors
    #[error("Failed to compose resources in {path}: {reason}")]
    #[diagnostic(code(banana::compose::failed))]
    CompositionFailed { path: String, reason: String },

    #[error("Failed to render template {path}: {reason}")]
    #[diagnostic(code(banana::compose::template_failed))]
    TemplateFailed { path: String, reason: String },

    // Patch errors
    #[error("Failed to patch {resource} at {field}: {reason}")]
    #[diagnostic(code(banana::patch::failed))]
    PatchFailed {
        resource: String,
        field: String,
        reason: String,
    },

    // Export errors
    #[error("Failed to export {path}: {reason}")]
    #[diagnostic(code(banana::export::failed))]
    ExportFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(banana::fs::write_failed), help("{reason}"))]
    FileWriteFailed { path: String, reason: String },

    #[error("Failed to read file: {path}")]
    #[diagnostic(code(banana::fs::read_failed), help("{reason}"))]
    FileReadFailed { path: String, reason: String },

    #[error("Encryption failed: {reason}")]
    #[diagnostic(
        code(banana::crypto::encryption_failed),
        help("Recipients are base64 X25519 public keys, see 'banana keygen'")
    )]
    EncryptionFailed { reason: String },

    #[error("Decryption failed: {reason}")]
    #[diagnostic(code(banana::crypto::decryption_failed))]
    DecryptionFailed { reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(banana::fs::io_error))]
    IoError { message: String },

    // Pipeline context
    #[error("Module '{module}' failed during {stage}")]
    #[diagnostic(code(banana::module::failed))]
    ModuleFailed {
        module: String,
        stage: Stage,
        #[source]
        source: Box<BananaError>,
    },
}

impl BananaError {
    /// Wrap an error with the module and stage it happened in
    pub fn module_failed(module: impl Into<String>, stage: Stage, source: BananaError) -> Self {
        BananaError::ModuleFailed {
            module: module.into(),
            stage,
            source: Box::new(source),
        }
    }

    /// Innermost error, unwrapping any module context
    pub fn root_cause(&self) -> &BananaError {
        match self {
            BananaError::ModuleFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Attach module and stage context to a failing result
pub trait StageContext<T> {
    fn stage(self, module: &str, stage: Stage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, module: &str, stage: Stage) -> Result<T> {
        self.map_err(|err| BananaError::module_failed(module, stage, err))
    }
}

impl From<std::io::Error> for BananaError {
    fn from(err: std::io::Error) -> Self {
        BananaError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for BananaError {
    fn from(err: serde_yaml::Error) -> Self {
        BananaError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<git2::Error> for BananaError {
    fn from(err: git2::Error) -> Self {
        BananaError::GitOperationFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, BananaError>;
