//! predx CLI - convert and verify probabilistic forecast tables.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            file,
            from,
            to,
            output,
            force,
            normalize,
        } => commands::convert::run(file, from, to, output, force, normalize, cli.verbose),

        Commands::Verify {
            file,
            from,
            expected,
            json,
        } => commands::verify::run(file, from, expected, json, cli.verbose),

        Commands::Summary { file, from, json } => {
            commands::summary::run(file, from, json, cli.verbose)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
