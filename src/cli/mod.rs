//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - build: Build command arguments
//! - vendor: Vendor command arguments
//! - init: Init command arguments
//! - decrypt: Decrypt command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};

pub mod build;
pub mod completions;
pub mod decrypt;
pub mod init;
pub mod vendor;

pub use build::BuildArgs;
pub use completions::CompletionsArgs;
pub use decrypt::DecryptArgs;
pub use init::InitArgs;
pub use vendor::VendorArgs;

/// Banana - Kubernetes module bundler
///
/// Assemble deployable Kubernetes bundles from a declarative module manifest.
#[derive(Parser, Debug)]
#[command(
    name = "banana",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Assemble deployable Kubernetes bundles from a module manifest",
    long_about = "Banana assembles deployable Kubernetes bundles. It reads banana.yaml, fetches \
                  every listed module from the local module catalog or a git repository, \
                  composes it with its components, sets ingress hostnames, injects secrets and \
                  writes the result, encrypting Secrets for the configured recipients.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  banana init                          \x1b[90m# Create banana.yaml\x1b[0m\n   \
                  banana build                         \x1b[90m# Print all modules as YAML\x1b[0m\n   \
                  banana build -o deploy               \x1b[90m# Write one directory per module\x1b[0m\n   \
                  banana keygen                        \x1b[90m# Create an encryption identity\x1b[0m\n   \
                  banana build -o deploy -r <key>      \x1b[90m# Encrypt Secrets for a recipient\x1b[0m\n   \
                  banana vendor                        \x1b[90m# Copy module sources into ./src\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every module of the manifest
    Build(BuildArgs),

    /// Copy module sources without building them
    Vendor(VendorArgs),

    /// Create a new banana.yaml
    Init(InitArgs),

    /// Generate an encryption identity and its recipient
    Keygen,

    /// Decrypt an encrypted bundle file
    Decrypt(DecryptArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
