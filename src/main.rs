// locsites - local CLI and API proxy for Sophos Central Web Control local sites

mod auth;
mod cli;
mod config;
mod error;
mod identity;
mod models;
mod proxy;
mod session;
mod sites;

use clap::Parser;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first to get the verbose flag
    let args = cli::Cli::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    cli::execute(args).await
}
