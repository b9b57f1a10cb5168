//! org-archiver - Back up a whole GitHub organization into one zip archive
//!
//! Lists every repository of an organization, clones them concurrently,
//! stores the raw listing next to the clones and packages the result.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Backup pipeline: worker pool, packaging, orchestration
//! - [`listing`] - Organization repository listing client
//! - [`infra`] - Infrastructure layer (git, filesystem)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
pub mod listing;
