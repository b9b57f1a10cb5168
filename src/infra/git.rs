//! Git operations
//!
//! Handles cloning repositories using the gix crate.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use thiserror::Error;

use crate::config::{defaults, Credentials};

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to clone repository
    #[error("Failed to clone '{url}': {error}")]
    CloneFailed { url: String, error: String },

    /// No directory name can be derived for the URL
    #[error("Cannot derive a destination directory from '{url}'")]
    InvalidDestination { url: String },

    /// Clone stopped by the run deadline
    #[error("Clone of '{url}' interrupted")]
    Interrupted { url: String },

    /// Destination already populated
    #[error("Destination '{path}' already exists")]
    DestinationExists { path: PathBuf },
}

/// Something that can clone a repository to a local path
///
/// Implementations block; callers run them on a blocking thread. The
/// `interrupt` flag is set when the run deadline fires and must be honored
/// promptly.
pub trait RepoCloner: Send + Sync + 'static {
    /// Clone `url` into `dest`, authenticating with `credentials`
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        credentials: &Credentials,
        interrupt: &AtomicBool,
    ) -> Result<(), GitError>;
}

impl<T: RepoCloner + ?Sized> RepoCloner for std::sync::Arc<T> {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        credentials: &Credentials,
        interrupt: &AtomicBool,
    ) -> Result<(), GitError> {
        (**self).clone_repo(url, dest, credentials, interrupt)
    }
}

/// Full clone of the default branch with gix
#[derive(Debug, Default, Clone, Copy)]
pub struct GixCloner;

impl GixCloner {
    /// Create a new gix-backed cloner
    pub fn new() -> Self {
        Self
    }
}

impl RepoCloner for GixCloner {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        credentials: &Credentials,
        interrupt: &AtomicBool,
    ) -> Result<(), GitError> {
        if dest.exists() {
            return Err(GitError::DestinationExists {
                path: dest.to_path_buf(),
            });
        }

        let username = defaults::CLONE_USERNAME.to_string();
        let password = credentials.token().to_string();

        // Dropping `prepare` or `checkout` before completion removes `dest`
        let mut prepare = gix::prepare_clone(url, dest)
            .map_err(|e| GitError::CloneFailed {
                url: url.to_string(),
                error: e.to_string(),
            })?
            .configure_connection(move |connection| {
                let username = username.clone();
                let password = password.clone();
                connection.set_credentials(move |action| match action {
                    gix::credentials::helper::Action::Get(ctx) => {
                        Ok(Some(gix::credentials::protocol::Outcome {
                            identity: gix::sec::identity::Account {
                                username: username.clone(),
                                password: password.clone(),
                            },
                            next: ctx.into(),
                        }))
                    }
                    gix::credentials::helper::Action::Store(_)
                    | gix::credentials::helper::Action::Erase(_) => Ok(None),
                });
                Ok(())
            });

        let (mut checkout, _outcome) = prepare
            .fetch_then_checkout(gix::progress::Discard, interrupt)
            .map_err(|e| interrupted_or(url, interrupt, &e))?;

        checkout
            .main_worktree(gix::progress::Discard, interrupt)
            .map_err(|e| interrupted_or(url, interrupt, &e))?;

        Ok(())
    }
}

fn interrupted_or(url: &str, interrupt: &AtomicBool, error: &dyn std::fmt::Display) -> GitError {
    if interrupt.load(std::sync::atomic::Ordering::SeqCst) {
        GitError::Interrupted {
            url: url.to_string(),
        }
    } else {
        GitError::CloneFailed {
            url: url.to_string(),
            error: error.to_string(),
        }
    }
}
