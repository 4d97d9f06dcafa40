use std::path::PathBuf;

use clap::Parser;

/// Arguments for the build command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Print every module as one YAML stream:\n    banana build\n\n\
                   Write one directory per module:\n    banana build -o deploy\n\n\
                   Encrypt module secrets for two recipients:\n    banana build -o deploy -r <key1> -r <key2>\n\n\
                   Use another module catalog:\n    banana build --default-origin https://github.com/org/modules.git")]
pub struct BuildArgs {
    /// Manifest file
    #[arg(long, short = 'f', default_value = "banana.yaml")]
    pub file: PathBuf,

    /// Directory to write bundles to (prints a YAML stream to stdout when omitted)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Directory below the output every module is written into
    #[arg(long, value_name = "DIR")]
    pub root_dir: Option<PathBuf>,

    /// Recipient public key Secrets are encrypted to (repeatable)
    #[arg(
        long = "recipient",
        short = 'r',
        value_name = "KEY",
        env = "BANANA_RECIPIENTS",
        value_delimiter = ','
    )]
    pub recipients: Vec<String>,

    /// Origin local module names are resolved beneath
    #[arg(long, value_name = "ORIGIN", env = "BANANA_DEFAULT_ORIGIN")]
    pub default_origin: Option<String>,

    /// Sort resources by kind (namespaces and CRDs first)
    #[arg(long)]
    pub reorder: bool,

    /// Label every resource with app.kubernetes.io/managed-by
    #[arg(long)]
    pub managed_by_label: bool,

    /// Allow kustomizations to load files outside the module
    #[arg(long)]
    pub no_load_restrictions: bool,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use super::*;

    #[test]
    fn test_cli_parsing_build_defaults() {
        let cli = Cli::try_parse_from(["banana", "build"]).unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.file, PathBuf::from("banana.yaml"));
                assert!(args.output.is_none());
                assert!(!args.reorder);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_parsing_build_recipients() {
        let cli = Cli::try_parse_from([
            "banana", "build", "-o", "out", "-r", "k1,k2", "--recipient", "k3", "--root-dir", "clusters",
        ])
        .unwrap();
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.output, Some(PathBuf::from("out")));
                assert_eq!(args.recipients, vec!["k1", "k2", "k3"]);
                assert_eq!(args.root_dir, Some(PathBuf::from("clusters")));
            }
            _ => panic!("Expected Build command"),
        }
    }
}
