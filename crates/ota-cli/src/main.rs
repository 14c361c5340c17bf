//! ota-gen - OTA package generator CLI

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ota_cli::cmd;
use ota_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // -v wins over RUST_LOG; otherwise RUST_LOG, falling back to info
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => cmd::generate::generate(&args, cli.config.as_deref()).await,
        Commands::Diff { old, new } => cmd::diff::diff(&old, &new).map(|()| ExitCode::SUCCESS),
        Commands::Pack { dir, archive } => {
            cmd::pack::pack(&dir, &archive).map(|()| ExitCode::SUCCESS)
        }
        Commands::Checksum { files } => cmd::checksum::checksum(&files).map(|()| ExitCode::SUCCESS),
    }
}
