//! settle CLI - live-reloading template server.
//!
//! Provides commands for:
//! - `serve`: Start the server, watching templates in local mode
//! - `check`: Parse the template directory once and report

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, ServeArgs};
use output::Output;

/// settle - reload the browser once template edits settle.
#[derive(Parser)]
#[command(name = "settle", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server.
    Serve(ServeArgs),
    /// Parse templates without starting the server.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Serve(args) if args.verbose);

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Serve(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "Command failed");
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check_subcommand() {
        let cli = Cli::try_parse_from(["settle", "check", "--templates-dir", "views"]).unwrap();
        assert!(matches!(cli.command, Commands::Check(_)));
    }
}
