use std::path::PathBuf;

use clap::Parser;

/// Arguments for the vendor command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Copy every module's sources into ./src:\n    banana vendor\n\n\
                   Refresh previously vendored modules:\n    banana vendor --force")]
pub struct VendorArgs {
    /// Manifest file
    #[arg(long, short = 'f', default_value = "banana.yaml")]
    pub file: PathBuf,

    /// Directory module sources are copied into
    #[arg(long, short = 'o', value_name = "DIR", default_value = "src")]
    pub output: PathBuf,

    /// Origin local module names are resolved beneath
    #[arg(long, value_name = "ORIGIN", env = "BANANA_DEFAULT_ORIGIN")]
    pub default_origin: Option<String>,

    /// Replace modules that were vendored before
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;

    #[test]
    fn test_cli_parsing_vendor() {
        let cli = Cli::try_parse_from(["banana", "vendor", "--force", "-o", "third_party"]).unwrap();
        match cli.command {
            Commands::Vendor(args) => {
                assert!(args.force);
                assert_eq!(args.output, PathBuf::from("third_party"));
            }
            _ => panic!("Expected Vendor command"),
        }
    }
}
