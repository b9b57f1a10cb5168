//! CLI command implementations

pub mod backup;
