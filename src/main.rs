//! Elasticsearch Index Dump Tool
//!
//! Dumps the full contents of an Elasticsearch index to a line-delimited
//! JSON file by draining a scan-and-scroll cursor page by page.
//!
//! # Usage
//!
//! ```bash
//! # Dump a whole index
//! esdump backup index=orders
//!
//! # Narrow to one mapping type with a larger page size
//! esdump backup index=orders type=order sizePerShard=500
//! ```

use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};

mod cli;
mod client;
mod config;
mod error;
mod export;

use cli::{CliInterface, Commands, JobParams};
use client::EsClient;
use error::Result;
use export::ExportResult;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// This function orchestrates the application startup:
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Dispatch the requested action
///
/// # Returns
/// * `Result<()>` - Success or error
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    match cli.args().command {
        Commands::Backup { ref params } => run_backup(&cli, params).await,
        Commands::Restore { .. } => run_restore(),
    }
}

/// Run the backup action
async fn run_backup(cli: &CliInterface, params: &[String]) -> Result<()> {
    info!("Started: backup");

    let job = JobParams::parse(params)?.into_job(cli.config());
    let client = EsClient::new(&cli.config().connection.url, &cli.config().connection)?;

    // Stop at the next page boundary on Ctrl+C
    let cancel_token = CancellationToken::new();
    let cancel_clone = cancel_token.clone();
    let ctrl_c_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => cancel_clone.cancel(),
            Err(err) => eprintln!("Failed to listen for Ctrl+C: {}", err),
        }
    });

    let result =
        export::run_backup(client, &job, cancel_token, cli.show_progress()).await;
    ctrl_c_handle.abort();

    print_summary(&job.index, &result?);
    Ok(())
}

/// Run the restore action
///
/// Restore is named on the interface but performs no work yet.
fn run_restore() -> Result<()> {
    info!("Started: restore");
    warn!("Restore is not implemented yet");
    Ok(())
}

/// Print the final export summary
fn print_summary(index: &str, result: &ExportResult) {
    if result.cancelled {
        println!(
            "Cancelled: exported {} documents from '{}' ({} pages, {} bytes, {} ms)",
            result.documents_exported,
            index,
            result.pages,
            result.file_size_bytes,
            result.elapsed_ms
        );
    } else {
        println!(
            "Exported {} documents from '{}' ({} pages, {} bytes, {} ms)",
            result.documents_exported,
            index,
            result.pages,
            result.file_size_bytes,
            result.elapsed_ms
        );
    }
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
