//! Hub Chantier command-line client.

mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("chantier_hub=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Health => commands::health::run(&cli.server).await,
        Commands::Login(args) => commands::login::run(&cli.server, args).await,
        Commands::Whoami(args) => commands::whoami::run(&cli.server, args).await,
        Commands::Chantiers(args) => commands::chantiers::run(&cli.server, args).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
