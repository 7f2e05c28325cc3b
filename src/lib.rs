//! Elasticsearch Index Dump Library
//!
//! This library provides the core functionality for the esdump CLI. It can
//! be used as a standalone library to build Elasticsearch backup tooling.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and job parameter parsing
//! - `client`: Elasticsearch scroll API client
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `export`: The dump pipeline (scan, serialize, write, coordinate)
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! use esdump::client::EsClient;
//! use esdump::config::Config;
//! use esdump::export::{self, ExportJob};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = EsClient::new("http://localhost:9200", &config.connection)?;
//!
//!     let job = ExportJob {
//!         index: "orders".to_string(),
//!         doc_type: None,
//!         size_per_shard: 100,
//!         scroll_ttl: Duration::from_secs(60),
//!         folder: PathBuf::from("backup"),
//!     };
//!
//!     let result =
//!         export::run_backup(client, &job, CancellationToken::new(), false).await?;
//!     println!("Exported {} documents", result.documents_exported);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;

// Re-export commonly used types
pub use cli::{CliArgs, CliInterface, JobParams};
pub use client::EsClient;
pub use config::Config;
pub use error::{EsdumpError, Result};
pub use export::{ExportCoordinator, ExportJob, ExportResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
