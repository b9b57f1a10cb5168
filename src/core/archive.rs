//! Zip packaging of the working directory
//!
//! Walks the tree in file-name order and writes every regular file and
//! symlink into a zip archive. Directories are implied by entry paths and
//! are not recorded. Symlinks are stored as their target string with the
//! unix symlink mode, never followed. Anything else (FIFOs, sockets,
//! devices) is skipped.
//!
//! Packaging is all-or-nothing: on any error the partly written archive is
//! deleted.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Read, Seek, Write};
use std::path::{Component, Path};

use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;

/// Files at or above this size need zip64 headers
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// Copy buffer for file payloads
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// What ended up in an archive
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Regular file entries
    pub files: usize,
    /// Symlink entries
    pub symlinks: usize,
    /// Uncompressed payload bytes
    pub bytes: u64,
}

impl ArchiveSummary {
    /// Total number of entries
    pub fn entries(&self) -> usize {
        self.files + self.symlinks
    }
}

/// Archive-internal path of `path` under `root`
///
/// Components are joined with `/` whatever the host separator is. Returns
/// `None` for the root itself or for paths outside it.
pub fn archive_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Package `root` into a new zip file at `dest`
///
/// Fails if `dest` already exists. The archive is complete and closed when
/// this returns `Ok`.
pub fn create_archive(root: &Path, dest: &Path) -> Result<ArchiveSummary, ArchiveError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ArchiveError::AlreadyExists {
                path: dest.to_path_buf(),
            },
            _ => write_error(dest, &e),
        })?;

    let result = write_entries(root, dest, BufWriter::new(file));
    if result.is_err() {
        let _ = std::fs::remove_file(dest);
    }
    result
}

fn write_entries<W: Write + Seek>(
    root: &Path,
    dest: &Path,
    writer: W,
) -> Result<ArchiveSummary, ArchiveError> {
    let mut zip = ZipWriter::new(writer);
    let mut summary = ArchiveSummary::default();
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .min_depth(1)
    {
        let entry = entry.map_err(|e| ArchiveError::Walk {
            path: e
                .path()
                .map_or_else(|| root.to_path_buf(), Path::to_path_buf),
            error: e.to_string(),
        })?;

        let file_type = entry.file_type();
        let path = entry.path();
        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() && !file_type.is_symlink() {
            tracing::debug!("Skipping special file {}", path.display());
            continue;
        }

        let Some(name) = entry_name(root, path)? else {
            continue;
        };

        if file_type.is_symlink() {
            let target = std::fs::read_link(path).map_err(|e| read_error(path, &e))?;
            let target = target.to_str().ok_or_else(|| ArchiveError::NonUtf8Path {
                path: path.to_path_buf(),
            })?;
            tracing::trace!("Adding symlink {name} -> {target}");

            let options = FileOptions::default().compression_method(CompressionMethod::Stored);
            zip.add_symlink(name, target, options)
                .map_err(|e| write_error(dest, &e))?;

            summary.symlinks += 1;
            summary.bytes += target.len() as u64;
            continue;
        }

        let metadata = entry.metadata().map_err(|e| ArchiveError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::trace!("Adding file {name}");

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(file_mode(&metadata))
            .large_file(metadata.len() >= ZIP64_THRESHOLD);
        zip.start_file(name, options).map_err(|e| write_error(dest, &e))?;

        let mut source = File::open(path).map_err(|e| read_error(path, &e))?;
        loop {
            let read = source
                .read(&mut buffer)
                .map_err(|e| read_error(path, &e))?;
            if read == 0 {
                break;
            }
            zip.write_all(&buffer[..read])
                .map_err(|e| write_error(dest, &e))?;
            summary.bytes += read as u64;
        }
        summary.files += 1;
    }

    let mut inner = zip.finish().map_err(|e| write_error(dest, &e))?;
    inner.flush().map_err(|e| write_error(dest, &e))?;

    Ok(summary)
}

/// Entry name for `path`, refusing names that would not survive as UTF-8
fn entry_name(root: &Path, path: &Path) -> Result<Option<String>, ArchiveError> {
    let relative_is_utf8 = path
        .strip_prefix(root)
        .map_or(true, |relative| relative.to_str().is_some());
    if !relative_is_utf8 {
        return Err(ArchiveError::NonUtf8Path {
            path: path.to_path_buf(),
        });
    }
    Ok(archive_path(root, path))
}

fn write_error(path: &Path, error: &dyn std::fmt::Display) -> ArchiveError {
    ArchiveError::Write {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

fn read_error(path: &Path, error: &std::io::Error) -> ArchiveError {
    ArchiveError::Read {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
