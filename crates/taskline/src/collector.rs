//! Exact-count result collection.
//!
//! The [`Collector`] is the single consumer of a result queue. It knows up
//! front how many results to expect and stops as soon as it has them, in
//! whatever order they arrive. Without a timeout an undersupplied queue would
//! block it forever; an optional deadline turns that into
//! [`Error::CollectTimeout`].

use crate::{BoundedQueue, Error, Result, TaskResult};
use core::time::Duration;
use std::{
    collections::{BTreeMap, HashSet},
    thread,
    time::Instant,
};
use tokio::sync::oneshot;

/// The results gathered by a [`Collector`], in arrival order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Collected {
    results: Vec<TaskResult>,
}

impl Collected {
    /// Results in the order the collector received them.
    ///
    /// This is not the submission order unless the worker group has a single
    /// worker.
    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<TaskResult> {
        self.results
    }

    /// Results keyed by task id.
    pub fn by_id(&self) -> BTreeMap<u64, &TaskResult> {
        self.results.iter().map(|r| (r.task_id, r)).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskResult> {
        self.results.iter().filter(|r| !r.is_ok())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Drains exactly `expected` results from a result queue.
#[derive(Debug)]
pub struct Collector {
    results: BoundedQueue<TaskResult>,
    expected: usize,
    timeout: Option<Duration>,
}

impl Collector {
    pub fn new(results: BoundedQueue<TaskResult>, expected: usize) -> Self {
        Self {
            results,
            expected,
            timeout: None,
        }
    }

    /// Bounds the whole collection to `timeout`, measured from the start of
    /// [`collect`](Self::collect).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Receives results until `expected` have arrived.
    ///
    /// Returns immediately with an empty set when nothing is expected.
    ///
    /// # Errors
    ///
    /// - [`Error::CollectTimeout`] if the deadline elapses first.
    /// - [`Error::ResultsShort`] if the queue closes first.
    /// - [`Error::DuplicateResult`] if a task id is reported twice.
    pub fn collect(self) -> Result<Collected> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut seen = HashSet::with_capacity(self.expected);
        let mut results = Vec::with_capacity(self.expected);

        while results.len() < self.expected {
            let next = match deadline {
                Some(deadline) => self.results.dequeue_until(deadline).map_err(|_| {
                    Error::CollectTimeout {
                        received: results.len(),
                        expected: self.expected,
                    }
                })?,
                None => self.results.dequeue(),
            };

            let Some(result) = next else {
                return Err(Error::ResultsShort {
                    received: results.len(),
                    expected: self.expected,
                });
            };

            if !seen.insert(result.task_id) {
                return Err(Error::DuplicateResult {
                    task_id: result.task_id,
                });
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(
                "Collected {} ({}/{})",
                result,
                results.len() + 1,
                self.expected
            );
            results.push(result);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Collector finished with {} results", results.len());

        Ok(Collected { results })
    }

    /// Runs [`collect`](Self::collect) on a dedicated thread.
    ///
    /// The returned [`Completion`] fires exactly once with the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the collector thread could not be
    /// spawned.
    pub fn spawn(self) -> Result<Completion> {
        let (tx, rx) = oneshot::channel();
        thread::Builder::new()
            .name("taskline-collector".to_string())
            .spawn(move || {
                // The receiver may already be gone; nothing left to report to.
                let _ = tx.send(self.collect());
            })
            .map_err(|e| Error::InvalidConfig {
                reason: format!("failed to spawn collector: {e}"),
            })?;
        Ok(Completion { rx })
    }
}

/// One-shot completion signal of a spawned [`Collector`].
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<Result<Collected>>,
}

impl Completion {
    /// Blocks the current thread until the collector reports.
    ///
    /// # Errors
    ///
    /// Returns the collector's own error, or [`Error::CollectorGone`] if the
    /// collector thread died without reporting.
    ///
    /// # Panics
    ///
    /// Panics if called from async code running on a tokio runtime; use
    /// [`completed`](Self::completed) there.
    pub fn wait(self) -> Result<Collected> {
        self.rx.blocking_recv().map_err(|_| Error::CollectorGone)?
    }

    /// Awaits the collector's report from async code.
    ///
    /// # Errors
    ///
    /// Same as [`wait`](Self::wait).
    pub async fn completed(self) -> Result<Collected> {
        self.rx.await.map_err(|_| Error::CollectorGone)?
    }
}
