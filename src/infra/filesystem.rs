//! Filesystem operations
//!
//! Handles file and directory operations.

use std::path::Path;

use crate::error::FilesystemError;

/// Create a single directory, failing if it already exists
pub fn create_dir(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        return Err(FilesystemError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    std::fs::create_dir(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Write bytes to a file
pub async fn write_file(path: &Path, content: &[u8]) -> Result<(), FilesystemError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| FilesystemError::WriteFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
}
