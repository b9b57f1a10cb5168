//! Clone worker pool
//!
//! A fixed number of workers drain a shared channel of clone URLs. The
//! channel is fed in listing order and holds at most one pending item, so
//! the feeder only gets ahead of the workers by a single URL.
//!
//! A failed clone is logged and recorded; the worker carries on with the
//! next URL. Workers stop when the channel closes or the deadline fires.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::Credentials;
use crate::core::deadline::Deadline;
use crate::core::repository::{clone_dir_name, RepositoryDescriptor};
use crate::infra::git::{GitError, RepoCloner};

/// Outcome of a pool run
#[derive(Debug, Default, Clone)]
pub struct PoolReport {
    /// Clone attempts started
    pub attempted: usize,
    /// URLs cloned successfully
    pub succeeded: Vec<String>,
    /// URLs that failed, with the error message
    pub failed: Vec<(String, String)>,
    /// Whether the deadline left work unfinished
    pub deadline_exceeded: bool,
}

impl PoolReport {
    fn merge(&mut self, other: PoolReport) {
        self.attempted += other.attempted;
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
        self.deadline_exceeded |= other.deadline_exceeded;
    }
}

type WorkQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// Fixed-size set of clone workers
pub struct ClonePool<C: RepoCloner> {
    cloner: Arc<C>,
    workers: usize,
    dest_dir: PathBuf,
    credentials: Credentials,
}

impl<C: RepoCloner> ClonePool<C> {
    /// Create a pool of `workers` (at least one) cloning into `dest_dir`
    pub fn new(cloner: C, workers: usize, dest_dir: PathBuf, credentials: Credentials) -> Self {
        Self {
            cloner: Arc::new(cloner),
            workers: workers.max(1),
            dest_dir,
            credentials,
        }
    }

    /// Number of workers
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Clone every repository, returning once all workers have exited
    pub async fn run(&self, repos: &[RepositoryDescriptor], deadline: &Deadline) -> PoolReport {
        let mut running = self.spawn(deadline);
        running.dispatch(repos, deadline).await;
        running.join(deadline).await
    }

    /// Start the workers; they idle until items are dispatched
    pub fn spawn(&self, deadline: &Deadline) -> RunningPool {
        let (tx, rx) = mpsc::channel::<String>(1);
        let queue: WorkQueue = Arc::new(Mutex::new(rx));

        let handles = (0..self.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: Arc::clone(&queue),
                    cloner: Arc::clone(&self.cloner),
                    dest_dir: self.dest_dir.clone(),
                    credentials: self.credentials.clone(),
                    deadline: deadline.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        RunningPool {
            tx,
            handles,
            expected: 0,
        }
    }
}

/// Workers that have been started and are waiting for items
pub struct RunningPool {
    tx: mpsc::Sender<String>,
    handles: Vec<JoinHandle<PoolReport>>,
    expected: usize,
}

impl RunningPool {
    /// Feed every clone URL to the workers in listing order
    ///
    /// Returns early if the deadline fires.
    pub async fn dispatch(&mut self, repos: &[RepositoryDescriptor], deadline: &Deadline) {
        let total = repos.len();
        self.expected += total;
        for (i, repo) in repos.iter().enumerate() {
            let sent = tokio::select! {
                biased;
                () = deadline.expired() => false,
                sent = self.tx.send(repo.clone_url.clone()) => sent.is_ok(),
            };
            if !sent {
                tracing::warn!("Stopped dispatching clones after {i}/{total}");
                return;
            }
            tracing::info!("Cloning of '{}' requested, {}/{}", repo.name, i + 1, total);
        }
    }

    /// Close the queue and wait for every worker to exit
    ///
    /// The deadline counts as exceeded only if it fired and left work
    /// undone: a dispatched item was never attempted or a clone was
    /// interrupted.
    pub async fn join(self, deadline: &Deadline) -> PoolReport {
        let Self {
            tx,
            handles,
            expected,
        } = self;
        drop(tx);

        let mut report = PoolReport::default();
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(worker_report) => report.merge(worker_report),
                Err(e) => {
                    tracing::error!("Clone worker {id} aborted: {e}");
                    report
                        .failed
                        .push((format!("<worker {id}>"), e.to_string()));
                }
            }
        }
        report.deadline_exceeded |= deadline.is_expired() && report.attempted < expected;
        report
    }
}

struct Worker<C: RepoCloner> {
    id: usize,
    queue: WorkQueue,
    cloner: Arc<C>,
    dest_dir: PathBuf,
    credentials: Credentials,
    deadline: Deadline,
}

impl<C: RepoCloner> Worker<C> {
    async fn run(self) -> PoolReport {
        let mut report = PoolReport::default();
        tracing::debug!("Starting clone worker {}", self.id);

        loop {
            let next = tokio::select! {
                biased;
                () = self.deadline.expired() => {
                    tracing::info!("Deadline reached, stopping clone worker {}", self.id);
                    return report;
                }
                url = async { self.queue.lock().await.recv().await } => url,
            };

            let Some(url) = next else {
                tracing::debug!("No more work for clone worker {}", self.id);
                return report;
            };

            report.attempted += 1;
            match self.clone_one(&url).await {
                Ok(()) => {
                    tracing::debug!("Cloned '{url}'");
                    report.succeeded.push(url);
                }
                Err(e) => {
                    tracing::warn!("Error cloning {url}: {e}");
                    report.deadline_exceeded |= matches!(e, GitError::Interrupted { .. });
                    report.failed.push((url, e.to_string()));
                }
            }
        }
    }

    async fn clone_one(&self, url: &str) -> Result<(), GitError> {
        let name = clone_dir_name(url).ok_or_else(|| GitError::InvalidDestination {
            url: url.to_string(),
        })?;
        let dest = self.dest_dir.join(name);

        let cloner = Arc::clone(&self.cloner);
        let credentials = self.credentials.clone();
        let interrupt = self.deadline.interrupt_flag();
        let task_url = url.to_string();

        tokio::task::spawn_blocking(move || {
            cloner.clone_repo(&task_url, &dest, &credentials, &interrupt)
        })
        .await
        .map_err(|e| GitError::CloneFailed {
            url: url.to_string(),
            error: e.to_string(),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Records every clone call and fails for URLs containing "broken"
    #[derive(Default)]
    struct RecordingCloner {
        calls: std::sync::Mutex<Vec<(String, PathBuf)>>,
    }

    impl RepoCloner for RecordingCloner {
        fn clone_repo(
            &self,
            url: &str,
            dest: &Path,
            _credentials: &Credentials,
            _interrupt: &AtomicBool,
        ) -> Result<(), GitError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
            if url.contains("broken") {
                return Err(GitError::CloneFailed {
                    url: url.to_string(),
                    error: "simulated failure".to_string(),
                });
            }
            std::fs::create_dir_all(dest).unwrap();
            Ok(())
        }
    }

    fn repos(count: usize) -> Vec<RepositoryDescriptor> {
        (0..count)
            .map(|i| {
                RepositoryDescriptor::new(
                    format!("repo-{i}"),
                    format!("https://github.com/acme/repo-{i}.git"),
                )
            })
            .collect()
    }

    fn pool(
        cloner: Arc<RecordingCloner>,
        workers: usize,
        dir: &Path,
    ) -> ClonePool<Arc<RecordingCloner>> {
        ClonePool::new(cloner, workers, dir.to_path_buf(), Credentials::new("token"))
    }

    #[tokio::test]
    async fn test_every_item_cloned_exactly_once() {
        for workers in [1, 3, 5, 16] {
            let temp = TempDir::new().unwrap();
            let cloner = Arc::new(RecordingCloner::default());
            let listing = repos(23);

            let report = pool(Arc::clone(&cloner), workers, temp.path())
                .run(&listing, &Deadline::never())
                .await;

            assert_eq!(report.attempted, 23, "workers={workers}");
            assert_eq!(report.succeeded.len(), 23);
            assert!(report.failed.is_empty());
            assert!(!report.deadline_exceeded);

            let calls = cloner.calls.lock().unwrap();
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for (url, _) in calls.iter() {
                *counts.entry(url.as_str()).or_default() += 1;
            }
            assert_eq!(counts.len(), 23);
            assert!(counts.values().all(|&c| c == 1), "no URL may be cloned twice");
            for repo in &listing {
                assert!(counts.contains_key(repo.clone_url.as_str()));
            }
        }
    }

    #[tokio::test]
    async fn test_destination_is_derived_from_url() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(RecordingCloner::default());
        let listing = vec![RepositoryDescriptor::new(
            "myrepo",
            "https://host/org/myrepo.git",
        )];

        pool(Arc::clone(&cloner), 2, temp.path())
            .run(&listing, &Deadline::never())
            .await;

        let calls = cloner.calls.lock().unwrap();
        assert_eq!(calls[0].1, temp.path().join("myrepo"));
        assert!(temp.path().join("myrepo").is_dir());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_clones() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(RecordingCloner::default());
        let mut listing = repos(6);
        listing.insert(0, RepositoryDescriptor::new("broken-a", "https://x/acme/broken-a.git"));
        listing.insert(4, RepositoryDescriptor::new("broken-b", "https://x/acme/broken-b.git"));

        let report = pool(Arc::clone(&cloner), 1, temp.path())
            .run(&listing, &Deadline::never())
            .await;

        assert_eq!(report.attempted, 8);
        assert_eq!(report.succeeded.len(), 6);
        assert_eq!(report.failed.len(), 2);
        assert!(report
            .failed
            .iter()
            .all(|(url, err)| url.contains("broken") && err.contains("simulated failure")));
        assert_eq!(cloner.calls.lock().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_single_worker_preserves_listing_order() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(RecordingCloner::default());
        let listing = repos(10);

        pool(Arc::clone(&cloner), 1, temp.path())
            .run(&listing, &Deadline::never())
            .await;

        let urls: Vec<_> = cloner
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(u, _)| u.clone())
            .collect();
        let expected: Vec<_> = listing.iter().map(|r| r.clone_url.clone()).collect();
        assert_eq!(urls, expected);
    }

    #[tokio::test]
    async fn test_underivable_destination_is_recoverable() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(RecordingCloner::default());
        let listing = vec![
            RepositoryDescriptor::new("bad", "https://x/acme/.git"),
            RepositoryDescriptor::new("good", "https://x/acme/good.git"),
        ];

        let report = pool(Arc::clone(&cloner), 2, temp.path())
            .run(&listing, &Deadline::never())
            .await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, vec!["https://x/acme/good.git".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(cloner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(RecordingCloner::default());

        let report = pool(cloner, 4, temp.path())
            .run(&[], &Deadline::never())
            .await;

        assert_eq!(report.attempted, 0);
        assert!(!report.deadline_exceeded);
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        let pool = ClonePool::new(
            Arc::new(RecordingCloner::default()),
            0,
            PathBuf::from("."),
            Credentials::new("token"),
        );
        assert_eq!(pool.workers(), 1);
    }

    /// Blocks until interrupted, counting how many clones started
    struct SlowCloner {
        started: AtomicUsize,
    }

    impl RepoCloner for SlowCloner {
        fn clone_repo(
            &self,
            url: &str,
            _dest: &Path,
            _credentials: &Credentials,
            interrupt: &AtomicBool,
        ) -> Result<(), GitError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            while !interrupt.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(GitError::Interrupted {
                url: url.to_string(),
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_deadline_stops_pool_promptly() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(SlowCloner {
            started: AtomicUsize::new(0),
        });
        let pool = ClonePool::new(
            Arc::clone(&cloner),
            3,
            temp.path().to_path_buf(),
            Credentials::new("token"),
        );
        let deadline = Deadline::after(Duration::from_millis(100));

        let report = tokio::time::timeout(Duration::from_secs(10), pool.run(&repos(10), &deadline))
            .await
            .expect("pool must not hang after the deadline");

        assert!(report.deadline_exceeded);
        assert_eq!(cloner.started.load(Ordering::SeqCst), 3);
        assert_eq!(report.attempted, 3);
        assert!(report.succeeded.is_empty());
        assert_eq!(report.failed.len(), 3);
    }

    #[tokio::test]
    async fn test_deadline_after_all_work_is_not_exceeded() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(RecordingCloner::default());
        let listing = repos(6);
        let deadline = Deadline::never();

        let mut running = pool(Arc::clone(&cloner), 3, temp.path()).spawn(&deadline);
        running.dispatch(&listing, &deadline).await;

        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let done = cloner.calls.lock().unwrap().len();
                if done == listing.len() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("every clone should finish");

        // Fires after the work is done but before the workers are joined
        deadline.expire();
        let report = running.join(&deadline).await;

        assert_eq!(report.attempted, 6);
        assert_eq!(report.succeeded.len(), 6);
        assert!(!report.deadline_exceeded);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_interrupted_clone_exceeds_deadline() {
        let temp = TempDir::new().unwrap();
        let cloner = Arc::new(SlowCloner {
            started: AtomicUsize::new(0),
        });
        let pool = ClonePool::new(
            Arc::clone(&cloner),
            2,
            temp.path().to_path_buf(),
            Credentials::new("token"),
        );
        let deadline = Deadline::after(Duration::from_millis(100));

        let report = tokio::time::timeout(Duration::from_secs(10), pool.run(&repos(2), &deadline))
            .await
            .expect("pool must not hang after the deadline");

        // Every item was attempted, but the clones never completed
        assert_eq!(report.attempted, 2);
        assert!(report.deadline_exceeded);
    }
}
