mod cmd;
mod config;
mod error;
mod output;

use clap::Parser;
use config::{Cli, Commands};

#[tokio::main]
async fn main() {
    // stdout carries statements; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Build(args) => cmd::build::run(args),
        Commands::Stream(args) => cmd::stream::run(args).await,
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
