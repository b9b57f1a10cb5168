//! Repository descriptors
//!
//! One entry of the organization listing. Only `name` and `clone_url` are
//! interpreted; every other field is kept verbatim so the metadata file
//! carries the full listing response.

use serde::{Deserialize, Serialize};

/// Listing metadata for one repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Repository name, unique within the organization
    pub name: String,
    /// HTTPS clone URL
    pub clone_url: String,
    /// Remaining listing fields, carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RepositoryDescriptor {
    /// Create a descriptor with no extra fields
    pub fn new(name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clone_url: clone_url.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Directory name a clone URL is checked out into
///
/// The final path segment with a trailing `.git` removed. Both `/` and `\`
/// count as separators. Returns `None` when nothing usable is left.
pub fn clone_dir_name(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    let name = base.strip_suffix(".git").unwrap_or(base);

    if name.is_empty() || name == "." || name == ".." || name.contains(':') {
        None
    } else {
        Some(name.to_string())
    }
}
