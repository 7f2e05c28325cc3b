//! Error handling module for esdump.
//!
//! This module provides error handling for the dump pipeline with:
//! - Structured classification of Elasticsearch error bodies
//! - Application-specific error kinds for every fatal condition the
//!   pipeline distinguishes (usage, folder, target, cursor, write)
//! - A crate-wide `Result` alias
//!
//! # Example
//!
//! ```rust,no_run
//! use esdump::error::{ClientError, Result};
//!
//! fn open_scan(index: &str) -> Result<()> {
//!     if index.is_empty() {
//!         return Err(ClientError::InvalidTarget(index.to_string()).into());
//!     }
//!     Ok(())
//! }
//! ```

pub mod es;
pub mod kinds;

// Re-export commonly used types
pub use es::{EsErrorBody, EsErrorCause, classify_response};
pub use kinds::{
    ClientError, ConfigError, EsdumpError, ExportError, Result, UsageError,
};
