//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use org_archiver::config::{BackupConfig, Credentials};
use org_archiver::infra::git::{GitError, RepoCloner};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Temporary output directory for a backup run
pub struct TestWorkspace {
    /// Temporary directory the run writes into
    pub dir: TempDir,
}

impl TestWorkspace {
    /// Create a new workspace in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Names of every entry directly inside the workspace
    #[allow(dead_code)]
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .expect("Failed to read workspace")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// The single zip archive in the workspace
    #[allow(dead_code)]
    pub fn archive(&self) -> PathBuf {
        let zips: Vec<PathBuf> = std::fs::read_dir(self.dir.path())
            .expect("Failed to read workspace")
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "zip"))
            .collect();
        assert_eq!(zips.len(), 1, "expected exactly one archive, found {zips:?}");
        zips.into_iter().next().unwrap()
    }

    /// Backup configuration pointing at `api_url` and writing here
    #[allow(dead_code)]
    pub fn config(&self, org: &str, api_url: &str) -> BackupConfig {
        let mut config = BackupConfig::new(Some(org.to_string()), Some("test-token".to_string()))
            .expect("valid config");
        config.api_url = api_url.to_string();
        config.output_dir = self.path();
        config
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Listing page with repositories `start..start + count`
#[allow(dead_code)]
pub fn repos_json(org: &str, start: usize, count: usize) -> serde_json::Value {
    let repos: Vec<_> = (start..start + count)
        .map(|i| {
            json!({
                "id": i,
                "name": format!("repo-{i}"),
                "full_name": format!("{org}/repo-{i}"),
                "clone_url": format!("https://github.com/{org}/repo-{i}.git"),
                "private": i % 2 == 0,
            })
        })
        .collect();
    json!(repos)
}

/// Serve `pages` as consecutive listing pages for `org`
#[allow(dead_code)]
pub async fn mount_listing(server: &MockServer, org: &str, pages: Vec<serde_json::Value>) {
    for (i, body) in pages.into_iter().enumerate() {
        Mock::given(method("GET"))
            .and(path(format!("/orgs/{org}/repos")))
            .and(query_param("page", (i + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }
}

/// Names of every entry in a zip archive, in archive order
#[allow(dead_code)]
pub fn archive_entries(archive: &Path) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(File::open(archive).expect("open archive"))
        .expect("valid zip archive");
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Read one entry of a zip archive as a string
#[allow(dead_code)]
pub fn read_entry(archive: &Path, name: &str) -> String {
    use std::io::Read;

    let mut zip = zip::ZipArchive::new(File::open(archive).expect("open archive"))
        .expect("valid zip archive");
    let mut entry = zip.by_name(name).expect("entry present");
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

/// Clone stand-in that writes a small tree instead of talking to a remote
///
/// URLs containing any of `fail` return an error; URLs containing any of
/// `hang` block until the run is interrupted.
#[derive(Default)]
#[allow(dead_code)]
pub struct FakeCloner {
    /// Every URL passed to `clone_repo`
    pub calls: Mutex<Vec<String>>,
    /// Substrings of URLs that fail
    pub fail: Vec<String>,
    /// Substrings of URLs that block until interrupted
    pub hang: Vec<String>,
    /// Delay before each clone finishes
    pub delay: Duration,
}

#[allow(dead_code)]
impl FakeCloner {
    /// Cloner where every clone succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs seen so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RepoCloner for FakeCloner {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        _credentials: &Credentials,
        interrupt: &AtomicBool,
    ) -> Result<(), GitError> {
        self.calls.lock().unwrap().push(url.to_string());
        std::thread::sleep(self.delay);

        if self.hang.iter().any(|s| url.contains(s.as_str())) {
            while !interrupt.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
            return Err(GitError::Interrupted {
                url: url.to_string(),
            });
        }

        if self.fail.iter().any(|s| url.contains(s.as_str())) {
            return Err(GitError::CloneFailed {
                url: url.to_string(),
                error: "repository not found".to_string(),
            });
        }

        std::fs::create_dir_all(dest.join("src")).unwrap();
        std::fs::write(dest.join("README.md"), url).unwrap();
        std::fs::write(dest.join("src").join("lib.rs"), "// lib").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink("README.md", dest.join("README")).unwrap();
        Ok(())
    }
}
