//! Shared run deadline
//!
//! One [`Deadline`] governs the whole run. Async code waits on
//! [`Deadline::expired`]; blocking clones poll the interrupt flag from
//! [`Deadline::interrupt_flag`]. Both flip together when the timer fires.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Cancellation scope shared by every stage of a run
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    interrupt: Arc<AtomicBool>,
    timeout: Option<Duration>,
}

impl Deadline {
    /// Create a deadline that only fires through [`Deadline::expire`]
    pub fn never() -> Self {
        Self {
            token: CancellationToken::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
            timeout: None,
        }
    }

    /// Create a deadline that fires after `timeout`
    ///
    /// Must be called from within a tokio runtime. The timer task exits early
    /// if the deadline is expired manually.
    pub fn after(timeout: Duration) -> Self {
        let deadline = Self {
            timeout: Some(timeout),
            ..Self::never()
        };

        let timer = deadline.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => {
                    tracing::warn!("Deadline of {:?} reached, cancelling remaining work", timeout);
                    timer.expire();
                }
                () = timer.token.cancelled() => {}
            }
        });

        deadline
    }

    /// Fire the deadline now
    pub fn expire(&self) {
        self.interrupt.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    /// Whether the deadline has fired
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the deadline fires
    pub async fn expired(&self) {
        self.token.cancelled().await;
    }

    /// Flag set when the deadline fires, for blocking operations
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Configured timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
