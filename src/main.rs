//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `tls_checker` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use tls_checker::config::{Cli, Command, NO_URLS_ERROR};
use tls_checker::initialization::{init_crypto_provider, init_logger_with};
use tls_checker::{build_scanner, read_url_list, server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is normal; anything it sets is picked up by clap's `env` attributes
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = cli.to_config();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    if let Err(e) = run(cli.command, config).await {
        eprintln!("tls_checker error: {e:#}");
        process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, config: Config) -> Result<()> {
    let scanner = build_scanner(&config).await?;

    match command {
        Command::Serve { .. } => server::start_server(config.listen_addr, Arc::new(scanner)).await,
        Command::Scan { file } => {
            let urls = read_url_list(&file).await?;
            if urls.is_empty() {
                anyhow::bail!(NO_URLS_ERROR);
            }
            let job = scanner.scan_and_store_urls(&urls).await;
            println!(
                "Scanned {} URL{} ({} valid, {} non-valid, {} not stored) - {}",
                job.processed,
                if job.processed == 1 { "" } else { "s" },
                job.processed - job.failed,
                job.failed,
                job.persist_failures,
                job.batch_id
            );
            for (verdict, count) in &job.verdict_counts {
                println!("  {verdict}: {count}");
            }
            println!("Results saved in {}", config.db_path.display());
            Ok(())
        }
        Command::Discover => {
            for url in scanner.extract_urls_from_codebase().await? {
                println!("{url}");
            }
            Ok(())
        }
    }
}
