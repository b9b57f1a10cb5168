//! Infrastructure layer
//!
//! Handles git clones and filesystem side effects.

pub mod filesystem;
pub mod git;
