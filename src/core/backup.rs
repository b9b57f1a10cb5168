//! Backup orchestration
//!
//! Runs the stages of a backup in order:
//!
//! 1. list every repository of the organization
//! 2. create the working directory
//! 3. persist the listing and clone every repository concurrently
//! 4. wait for both to finish
//! 5. package the working directory into a zip archive and remove it
//!
//! Every failure except an individual clone aborts the run. If the deadline
//! fires while cloning, whatever was cloned is still packaged and the run
//! then reports [`BackupError::DeadlineExceeded`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;

use crate::config::BackupConfig;
use crate::core::archive::{self, ArchiveSummary};
use crate::core::deadline::Deadline;
use crate::core::metadata;
use crate::core::pool::{ClonePool, PoolReport};
use crate::core::workdir::WorkingDirectory;
use crate::error::BackupError;
use crate::infra::git::{GixCloner, RepoCloner};
use crate::listing::ListingClient;

/// Stage a backup run is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStage {
    /// Fetching the repository listing
    Listing,
    /// Working directory exists, nothing written yet
    DirectoryCreated,
    /// Metadata persistence and cloning in progress
    Running,
    /// Waiting for the persister and clone workers
    Draining,
    /// Writing the archive
    Packaging,
    /// Archive written and working directory removed
    Packaged,
}

impl fmt::Display for BackupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Listing => "listing",
            Self::DirectoryCreated => "directory-created",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Packaging => "packaging",
            Self::Packaged => "packaged",
        };
        f.write_str(name)
    }
}

/// Callback invoked on every stage transition
pub type StageCallback = Box<dyn Fn(BackupStage) + Send + Sync>;

/// Result of a completed backup
#[derive(Debug, Clone)]
pub struct BackupSummary {
    /// Repositories in the listing
    pub repositories: usize,
    /// Clone outcomes
    pub pool: PoolReport,
    /// Archive contents
    pub archive: ArchiveSummary,
    /// Where the archive was written
    pub archive_path: PathBuf,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// A configured backup run
pub struct Backup<C: RepoCloner> {
    config: BackupConfig,
    listing: ListingClient,
    cloner: Arc<C>,
    on_stage: Option<StageCallback>,
}

impl Backup<GixCloner> {
    /// Create a backup that clones with gix
    pub fn new(config: BackupConfig) -> Self {
        let listing =
            ListingClient::with_config(config.api_url.clone(), config.per_page, config.max_pages);
        Self {
            config,
            listing,
            cloner: Arc::new(GixCloner::new()),
            on_stage: None,
        }
    }
}

impl<C: RepoCloner> Backup<C> {
    /// Replace the clone implementation
    pub fn with_cloner<D: RepoCloner>(self, cloner: D) -> Backup<D> {
        Backup {
            config: self.config,
            listing: self.listing,
            cloner: Arc::new(cloner),
            on_stage: self.on_stage,
        }
    }

    /// Register a stage transition callback
    pub fn on_stage(mut self, callback: StageCallback) -> Self {
        self.on_stage = Some(callback);
        self
    }

    /// The run configuration
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Run under a deadline of `config.timeout`
    pub async fn run(&self) -> Result<BackupSummary, BackupError> {
        let deadline = Deadline::after(self.config.timeout);
        self.run_until(&deadline).await
    }

    /// Run under an existing deadline
    pub async fn run_until(&self, deadline: &Deadline) -> Result<BackupSummary, BackupError> {
        let started = Instant::now();
        let org = &self.config.org;

        self.enter(BackupStage::Listing);
        let repos = self
            .listing
            .list_org_repos(org, &self.config.credentials, deadline)
            .await?;
        tracing::info!("Data for {} repositories fetched in total", repos.len());

        let workdir = WorkingDirectory::create(&self.config.output_dir, org, Local::now())?;
        self.enter(BackupStage::DirectoryCreated);

        let repos = Arc::new(repos);
        let persister = {
            let repos = Arc::clone(&repos);
            let dir = workdir.path().to_path_buf();
            tokio::spawn(async move { metadata::store_responses(&repos, &dir).await })
        };
        let pool = ClonePool::new(
            Arc::clone(&self.cloner),
            self.config.workers,
            workdir.path().to_path_buf(),
            self.config.credentials.clone(),
        );

        let mut workers = pool.spawn(deadline);
        self.enter(BackupStage::Running);
        workers.dispatch(&repos, deadline).await;

        self.enter(BackupStage::Draining);
        tracing::info!("Waiting for workers to finish");
        let (persisted, report) = tokio::join!(persister, workers.join(deadline));

        persisted.map_err(|e| BackupError::TaskFailed {
            task: "metadata".to_string(),
            error: e.to_string(),
        })??;

        tracing::info!(
            "Cloned {}/{} repositories ({} failed)",
            report.succeeded.len(),
            repos.len(),
            report.failed.len()
        );

        self.enter(BackupStage::Packaging);
        let archive_path = workdir.archive_path();
        let archive = {
            let root = workdir.path().to_path_buf();
            let dest = archive_path.clone();
            tokio::task::spawn_blocking(move || archive::create_archive(&root, &dest))
                .await
                .map_err(|e| BackupError::TaskFailed {
                    task: "archive".to_string(),
                    error: e.to_string(),
                })??
        };
        tracing::info!(
            "Wrote {} entries to {}",
            archive.entries(),
            archive_path.display()
        );

        workdir.remove()?;
        self.enter(BackupStage::Packaged);

        if report.deadline_exceeded {
            return Err(BackupError::DeadlineExceeded {
                archive: archive_path,
            });
        }

        Ok(BackupSummary {
            repositories: repos.len(),
            pool: report,
            archive,
            archive_path,
            elapsed: started.elapsed(),
        })
    }

    fn enter(&self, stage: BackupStage) {
        tracing::debug!("Backup stage: {stage}");
        if let Some(callback) = &self.on_stage {
            callback(stage);
        }
    }
}
