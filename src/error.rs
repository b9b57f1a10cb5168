//! Error types for org-archiver
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Organization not provided
    #[error("Organization is required (set ORG or pass --org)")]
    MissingOrg,

    /// Access token not provided
    #[error("Access token is required (set GITHUB_TOKEN or pass --token)")]
    MissingToken,

    /// Tunable out of range
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Repository listing errors
#[derive(Error, Debug)]
pub enum ListingError {
    /// Transport failure
    #[error("Network error fetching page {page} from '{url}': {error}")]
    NetworkError {
        url: String,
        page: usize,
        error: String,
    },

    /// Non-OK response status
    #[error("Received invalid response code for page {page}: {status}")]
    ProtocolError { page: usize, status: u16 },

    /// Payload is not a list of repositories
    #[error("Could not decode page {page}: {error}")]
    DecodeError { page: usize, error: String },

    /// Shared deadline fired before the listing finished
    #[error("Deadline exceeded while listing repositories (page {page})")]
    DeadlineExceeded { page: usize },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Target already exists
    #[error("'{path}' already exists")]
    AlreadyExists { path: PathBuf },
}

/// Metadata persistence errors
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Descriptors could not be encoded
    #[error("Could not serialize repository metadata: {0}")]
    Serialize(String),

    /// Metadata file could not be written
    #[error(transparent)]
    Write(#[from] FilesystemError),
}

/// Archive packaging errors
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Directory traversal failed
    #[error("Failed to walk '{path}': {error}")]
    Walk { path: PathBuf, error: String },

    /// Source file or link could not be read
    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Archive container could not be written
    #[error("Failed to write archive '{path}': {error}")]
    Write { path: PathBuf, error: String },

    /// Archive file already exists
    #[error("Archive '{path}' already exists")]
    AlreadyExists { path: PathBuf },

    /// Entry name or link target cannot be stored as a zip path
    #[error("'{path}' is not valid UTF-8 and cannot be archived")]
    NonUtf8Path { path: PathBuf },
}

/// Top-level org-archiver error type
#[derive(Error, Debug)]
pub enum BackupError {
    /// Config error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Listing error
    #[error("Could not fetch repositories: {0}")]
    Listing(#[from] ListingError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Metadata error
    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Archive error
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Deadline fired during cloning; a partial archive was still written
    #[error("Deadline exceeded before all repositories were cloned; partial archive written to '{archive}'")]
    DeadlineExceeded { archive: PathBuf },

    /// A concurrent task could not be joined
    #[error("Task '{task}' failed: {error}")]
    TaskFailed { task: String, error: String },
}
