//! Backup pipeline
//!
//! # Submodules
//!
//! - [`repository`] - Repository descriptors and clone directory naming
//! - [`deadline`] - Shared run deadline
//! - [`workdir`] - Working directory lifecycle
//! - [`metadata`] - Listing metadata persistence
//! - [`pool`] - Clone worker pool
//! - [`archive`] - Zip packaging
//! - [`backup`] - Orchestration of the stages above

pub mod archive;
pub mod backup;
pub mod deadline;
pub mod metadata;
pub mod pool;
pub mod repository;
pub mod workdir;
