//! Tessera binary: session server and small client utilities.

mod backend;
mod cli;
mod commands;

use clap::Parser;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve(args)) => commands::serve::run(&args).await,
        Some(Commands::Health(args)) => commands::health::run(&args).await,
        Some(Commands::Whoami(args)) => commands::whoami::run(&args).await,
        None => {
            // Default to serving with environment/default configuration
            let cli = Cli::parse_from(["tessera", "serve"]);
            match cli.command {
                Some(Commands::Serve(args)) => commands::serve::run(&args).await,
                _ => Ok(()),
            }
        }
    }
}
