//! Banana - Kubernetes module bundler
//!
//! Assembles deployable Kubernetes bundles from a declarative module manifest.

use clap::Parser;

use banana::cli::{Cli, Commands};
use banana::commands;
use banana::logging;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_level.as_deref());

    let verbose = cli.verbose;
    let result = match cli.command {
        Commands::Build(args) => commands::build::run(args, verbose),
        Commands::Vendor(args) => commands::vendor::run(args, verbose),
        Commands::Init(args) => commands::init::run(args),
        Commands::Keygen => commands::keygen::run(),
        Commands::Decrypt(args) => commands::decrypt::run(args),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}
