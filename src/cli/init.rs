use std::path::PathBuf;

use clap::Parser;

/// Arguments for the init command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Create banana.yaml in the current directory:\n    banana init\n\n\
                   Name the cluster:\n    banana init --name prod-eu")]
pub struct InitArgs {
    /// Manifest file to create
    #[arg(long, short = 'f', default_value = "banana.yaml")]
    pub file: PathBuf,

    /// Cluster or environment name (defaults to the directory name)
    #[arg(long)]
    pub name: Option<String>,
}
