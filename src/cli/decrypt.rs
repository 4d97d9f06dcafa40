use std::path::PathBuf;

use clap::Parser;

/// Arguments for the decrypt command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Decrypt an exported Secret:\n    banana decrypt deploy/app/secret_creds.yaml --identity <key>\n\n\
                   Use the identity from the environment:\n    BANANA_IDENTITY=<key> banana decrypt bundle.yaml")]
pub struct DecryptArgs {
    /// Encrypted YAML file (may hold several documents)
    pub file: PathBuf,

    /// Identity (secret key) printed by 'banana keygen'
    #[arg(long, short = 'i', env = "BANANA_IDENTITY", hide_env_values = true)]
    pub identity: String,
}
