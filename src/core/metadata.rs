//! Listing metadata persistence
//!
//! Writes the complete listing result, unmodified, as pretty-printed JSON
//! inside the working directory.

use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::repository::RepositoryDescriptor;
use crate::error::MetadataError;
use crate::infra::filesystem;

/// Serialize `repos` into `<dir>/responses.json`
///
/// Returns the path of the written file.
pub async fn store_responses(
    repos: &[RepositoryDescriptor],
    dir: &Path,
) -> Result<PathBuf, MetadataError> {
    tracing::info!("Saving fetched repository responses to file");

    let json =
        serde_json::to_vec_pretty(repos).map_err(|e| MetadataError::Serialize(e.to_string()))?;
    let path = dir.join(defaults::RESPONSES_FILE);
    filesystem::write_file(&path, &json).await?;

    tracing::info!("Fetched repository responses saved to {}", path.display());
    Ok(path)
}
