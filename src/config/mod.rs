//! Configuration and constants
//!
//! [`BackupConfig`] is built once at startup and handed to the orchestrator.
//! Nothing below this module reads the process environment.

pub mod defaults;
pub mod urls;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Access credentials for the listing API and clones
#[derive(Clone)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    /// Wrap an access token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// The raw access token
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Settings for one backup run
#[derive(Debug, Clone)]
pub struct BackupConfig {
    /// Organization whose repositories are backed up
    pub org: String,
    /// Access credentials
    pub credentials: Credentials,
    /// Listing API base URL
    pub api_url: String,
    /// Number of clone workers
    pub workers: usize,
    /// Repositories per listing page
    pub per_page: usize,
    /// Maximum number of listing pages
    pub max_pages: usize,
    /// Deadline for the whole run
    pub timeout: Duration,
    /// Directory the working directory and archive are created in
    pub output_dir: PathBuf,
}

impl BackupConfig {
    /// Build a configuration with default tunables
    ///
    /// Empty organization or token values are rejected.
    pub fn new(org: Option<String>, token: Option<String>) -> Result<Self, ConfigError> {
        let org = org
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingOrg)?;
        let token = token
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        Ok(Self {
            org,
            credentials: Credentials::new(token),
            api_url: urls::GITHUB_API.to_string(),
            workers: defaults::CLONING_WORKERS,
            per_page: defaults::PER_PAGE,
            max_pages: defaults::MAX_PAGES,
            timeout: Duration::from_secs(defaults::PROGRAM_TIMEOUT_SECS),
            output_dir: PathBuf::from("."),
        })
    }

    /// Check the tunables are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidValue {
                name: "workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.per_page == 0 || self.per_page > 100 {
            return Err(ConfigError::InvalidValue {
                name: "page-size".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max-pages".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "timeout".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
