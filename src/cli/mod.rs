//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use crate::config::{defaults, urls, BackupConfig};
use crate::error::ConfigError;
use output::OutputConfig;

/// org-archiver - Back up every repository of a GitHub organization
///
/// Clones all repositories of the organization, stores the raw listing
/// response next to them and packages everything into one zip archive.
#[derive(Parser, Debug)]
#[command(name = "org-archiver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Organization to back up
    #[arg(long, env = "ORG")]
    pub org: Option<String>,

    /// Access token used for the listing API and clones
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Number of concurrent clone workers
    #[arg(long, default_value_t = defaults::CLONING_WORKERS)]
    pub workers: usize,

    /// Deadline for the whole run, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = defaults::PROGRAM_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Repositories requested per listing page (1-100)
    #[arg(long, default_value_t = defaults::PER_PAGE)]
    pub page_size: usize,

    /// Maximum number of listing pages
    #[arg(long, default_value_t = defaults::MAX_PAGES)]
    pub max_pages: usize,

    /// Listing API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = urls::GITHUB_API)]
    pub api_url: String,

    /// Directory the archive is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Output settings derived from the flags
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::new(self.quiet, self.verbose)
    }

    /// Build the run configuration from the parsed arguments
    pub fn backup_config(&self) -> Result<BackupConfig, ConfigError> {
        let mut config = BackupConfig::new(self.org.clone(), self.token.clone())?;
        config.api_url.clone_from(&self.api_url);
        config.workers = self.workers;
        config.per_page = self.page_size;
        config.max_pages = self.max_pages;
        config.timeout = Duration::from_secs(self.timeout);
        config.output_dir.clone_from(&self.output_dir);
        config.validate()?;
        Ok(config)
    }

    /// Execute the backup
    pub async fn run(self) -> Result<()> {
        let config = self.backup_config()?;
        commands::backup::execute(config, &self.output_config()).await
    }
}
