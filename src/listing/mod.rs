//! Organization repository listing
//!
//! Handles fetching repository descriptors from the GitHub REST API.

pub mod client;

pub use client::ListingClient;
