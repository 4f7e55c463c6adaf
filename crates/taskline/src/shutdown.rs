//! Cooperative graceful shutdown for long-running async handlers.
//!
//! The [`Supervisor`] owns two things: a level-triggered
//! [`CancellationToken`] that handlers poll, and a [`TaskTracker`] acting as
//! the counted barrier over every admitted handler. Shutdown is two-phase:
//! first no new handlers are admitted and the token is set, then the caller
//! waits until every handler has observed the token and returned.
//!
//! Cancellation is never preemptive. A handler that does not check the token
//! will not stop, so every blocking wait inside a handler must be bounded
//! (see [`DEFAULT_POLL_INTERVAL`]).

use crate::{Error, Result};
use core::time::Duration;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Longest a handler should block before re-checking the token.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Admits handlers, broadcasts cancellation and waits for them to drain.
///
/// Clones share the same token, tracker and admission gate.
#[derive(Clone, Debug)]
pub struct Supervisor {
    token: CancellationToken,
    tracker: TaskTracker,
    // `true` while admitting. Held across the check and the spawn, and by
    // `shutdown` while closing, so no handler slips in behind the barrier.
    admitting: Arc<Mutex<bool>>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self {
            token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            admitting: Arc::new(Mutex::new(true)),
        }
    }
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the shared cancellation signal.
    ///
    /// Once cancelled it stays cancelled.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Number of admitted handlers that have not returned yet.
    pub fn active(&self) -> usize {
        self.tracker.len()
    }

    /// Admits `handler` and spawns it on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServiceShutdown`] once shutdown has begun.
    pub fn spawn<F>(&self, handler: F) -> Result<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let admitting = self.admitting.lock();
        if !*admitting {
            return Err(Error::ServiceShutdown);
        }
        Ok(self.tracker.spawn(handler))
    }

    /// Sets the cancellation token, stops admitting handlers and waits for
    /// every admitted handler to exit.
    ///
    /// With `drain_timeout == None` this waits as long as it takes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DrainTimeout`] if handlers are still running when
    /// `drain_timeout` elapses. They keep running; their token stays set.
    pub async fn shutdown(&self, drain_timeout: Option<Duration>) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::info!("Refusing new handlers");
        {
            let mut admitting = self.admitting.lock();
            *admitting = false;
            self.tracker.close();
            self.token.cancel();
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Draining {} active handlers", self.tracker.len());

        match drain_timeout {
            None => self.tracker.wait().await,
            Some(limit) => {
                if timeout(limit, self.tracker.wait()).await.is_err() {
                    let remaining = self.tracker.len();
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Graceful drain timed out ({remaining} handlers still active)");
                    return Err(Error::DrainTimeout { remaining });
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!("All handlers drained");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portable_atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{Instant, sleep};

    /// A handler that only ever blocks for `poll` at a time.
    async fn polling_handler(token: CancellationToken, poll: Duration, exited: Arc<AtomicUsize>) {
        loop {
            if token.is_cancelled() {
                break;
            }
            sleep(poll).await;
        }
        exited.fetch_add(1, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn handlers_observe_cancellation_within_one_interval() {
        let supervisor = Supervisor::new();
        let exited = Arc::new(AtomicUsize::new(0));
        let poll = Duration::from_millis(50);

        for _ in 0..4 {
            supervisor
                .spawn(polling_handler(supervisor.token(), poll, Arc::clone(&exited)))
                .unwrap();
        }
        sleep(Duration::from_millis(20)).await;
        assert_eq!(supervisor.active(), 4);

        let start = Instant::now();
        supervisor.shutdown(None).await.unwrap();

        assert!(start.elapsed() < poll * 3);
        assert_eq!(exited.load(Ordering::SeqCst), 4, "barrier waits for all");
        assert_eq!(supervisor.active(), 0);
    }

    #[tokio::test]
    async fn no_admission_after_shutdown_begins() {
        let supervisor = Supervisor::new();
        supervisor.shutdown(None).await.unwrap();

        assert!(supervisor.is_shutting_down());
        let err = supervisor.spawn(async {}).unwrap_err();
        assert_eq!(err, Error::ServiceShutdown);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn nothing_is_admitted_behind_the_barrier() {
        for _ in 0..200 {
            let supervisor = Supervisor::new();
            let admitted = Arc::new(AtomicUsize::new(0));
            let finished = Arc::new(AtomicUsize::new(0));

            let spawners: Vec<_> = (0..4)
                .map(|_| {
                    let supervisor = supervisor.clone();
                    let admitted = Arc::clone(&admitted);
                    let finished = Arc::clone(&finished);
                    tokio::spawn(async move {
                        loop {
                            let finished = Arc::clone(&finished);
                            let handler = async move {
                                finished.fetch_add(1, Ordering::SeqCst);
                            };
                            if supervisor.spawn(handler).is_err() {
                                break;
                            }
                            admitted.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                        }
                    })
                })
                .collect();

            tokio::task::yield_now().await;
            supervisor.shutdown(None).await.unwrap();
            let finished_at_shutdown = finished.load(Ordering::SeqCst);

            for spawner in spawners {
                spawner.await.unwrap();
            }
            assert_eq!(admitted.load(Ordering::SeqCst), finished_at_shutdown);
        }
    }

    #[tokio::test]
    async fn token_is_level_triggered() {
        let supervisor = Supervisor::new();
        let token = supervisor.token();
        supervisor.shutdown(None).await.unwrap();

        assert!(token.is_cancelled());
        assert!(supervisor.token().is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_timeout_reports_stuck_handlers() {
        let supervisor = Supervisor::new();
        // Never checks the token.
        supervisor
            .spawn(async { sleep(Duration::from_secs(3600)).await })
            .unwrap();

        let err = supervisor
            .shutdown(Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert_eq!(err, Error::DrainTimeout { remaining: 1 });
    }

    #[tokio::test]
    async fn shutdown_with_no_handlers_is_immediate() {
        let supervisor = Supervisor::new();
        supervisor
            .shutdown(Some(Duration::from_millis(10)))
            .await
            .unwrap();
    }
}
