//! Command-line interface for esdump
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Job parameter parsing (`name=value` tokens)

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

use crate::config::Config;
use crate::error::{Result, UsageError};
use crate::export::ExportJob;

/// Elasticsearch index dump tool
#[derive(Parser, Debug)]
#[command(
    name = "esdump",
    version,
    about = "Elasticsearch index dump tool",
    long_about = "Dumps the full contents of an Elasticsearch index to a line-delimited
JSON file by draining a scan-and-scroll cursor page by page."
)]
pub struct CliArgs {
    /// Elasticsearch base URL
    ///
    /// Overrides the connection URL from the config file.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Backup folder
    ///
    /// Overrides the backup folder from the config file.
    #[arg(long, value_name = "DIR")]
    pub folder: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (no progress bar)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for esdump
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump an index to a line-delimited JSON file
    Backup {
        /// Job parameters as name=value tokens:
        /// index=NAME [type=NAME] [sizePerShard=N]
        #[arg(value_name = "PARAM")]
        params: Vec<String>,
    },

    /// Restore an index from a dump file
    Restore {
        /// Job parameters as name=value tokens
        #[arg(value_name = "PARAM")]
        params: Vec<String>,
    },
}

/// Job parameters parsed from `name=value` tokens
///
/// `index` is required; everything else falls back to configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobParams {
    /// Index to dump
    pub index: String,

    /// Optional mapping type filter
    pub doc_type: Option<String>,

    /// Scroll page size override
    pub size_per_shard: Option<u32>,
}

impl JobParams {
    /// Parse job parameters from `name=value` tokens
    ///
    /// Unknown names are ignored with a warning; a missing or empty
    /// `index` is a fatal usage error.
    ///
    /// # Arguments
    /// * `tokens` - Raw positional tokens from the subcommand
    ///
    /// # Returns
    /// * `Result<JobParams>` - Parsed parameters or usage error
    pub fn parse(tokens: &[String]) -> Result<Self> {
        let mut index: Option<String> = None;
        let mut doc_type: Option<String> = None;
        let mut size_per_shard: Option<u32> = None;

        for token in tokens {
            let Some((name, value)) = token.split_once('=') else {
                return Err(UsageError::MalformedToken(token.clone()).into());
            };

            match name {
                "index" => {
                    if !value.is_empty() {
                        index = Some(value.to_string());
                    }
                }
                "type" => {
                    if !value.is_empty() {
                        doc_type = Some(value.to_string());
                    }
                }
                "sizePerShard" => {
                    let parsed = value.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(
                        || UsageError::InvalidParameter {
                            name: name.to_string(),
                            value: value.to_string(),
                        },
                    )?;
                    size_per_shard = Some(parsed);
                }
                other => warn!("Ignoring unknown parameter '{}'", other),
            }
        }

        let Some(index) = index else {
            return Err(UsageError::MissingParameter("index".to_string()).into());
        };

        Ok(Self {
            index,
            doc_type,
            size_per_shard,
        })
    }

    /// Build the export job from these parameters and the configuration
    ///
    /// # Arguments
    /// * `config` - Loaded configuration supplying the defaults
    pub fn into_job(self, config: &Config) -> ExportJob {
        ExportJob {
            index: self.index,
            doc_type: self.doc_type,
            size_per_shard: self
                .size_per_shard
                .unwrap_or(config.backup.size_per_shard),
            scroll_ttl: config.scroll_ttl(),
            folder: config.backup.folder.clone(),
        }
    }
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Self::load_config(&args)?;

        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let config_path = args.config_file.as_deref();
        let mut config = Config::load_from_file(config_path)?;

        Self::apply_args_to_config(&mut config, args);
        config.validate()?;

        Ok(config)
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    ///
    /// # Arguments
    /// * `config` - Configuration to modify
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Some(ref url) = args.url {
            config.connection.url = url.clone();
        }
        if let Some(ref folder) = args.folder {
            config.backup.folder = folder.clone();
        }
    }

    /// Get the configuration
    ///
    /// # Returns
    /// * `&Config` - Reference to configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    ///
    /// # Returns
    /// * `&CliArgs` - Reference to arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Whether a progress bar should be rendered
    pub fn show_progress(&self) -> bool {
        !self.args.quiet
    }
}
