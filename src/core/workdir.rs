//! Working directory lifecycle
//!
//! The working directory holds every clone plus the metadata file until the
//! archive is written. Its name embeds the organization and the creation
//! time; the archive is written next to it with a `.zip` extension.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::defaults;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Directory a backup run writes into
#[derive(Debug, Clone)]
pub struct WorkingDirectory {
    path: PathBuf,
}

impl WorkingDirectory {
    /// Directory name for `org` at `timestamp`
    pub fn dir_name(org: &str, timestamp: DateTime<Local>) -> String {
        format!(
            "{org}-archive-{}",
            timestamp.format(defaults::DIR_DATE_FORMAT)
        )
    }

    /// Create `<parent>/<org>-archive-<timestamp>`
    ///
    /// Fails if the directory already exists.
    pub fn create(
        parent: &Path,
        org: &str,
        timestamp: DateTime<Local>,
    ) -> Result<Self, FilesystemError> {
        let path = parent.join(Self::dir_name(org, timestamp));
        filesystem::create_dir(&path)?;
        tracing::debug!("Created working directory {}", path.display());
        Ok(Self { path })
    }

    /// Path of the working directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the archive produced from this directory
    pub fn archive_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".zip");
        self.path.with_file_name(name)
    }

    /// Remove the directory and everything in it
    pub fn remove(self) -> Result<(), FilesystemError> {
        filesystem::remove_dir_all(&self.path)?;
        tracing::debug!("Removed working directory {}", self.path.display());
        Ok(())
    }
}
