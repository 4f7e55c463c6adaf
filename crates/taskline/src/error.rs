//! Error types for the task pipeline and the shutdown supervisor.
//!
//! Per-task failures never show up here: they travel inside
//! [`TaskResult::value`](crate::TaskResult) as a [`TaskError`](crate::TaskError)
//! so one bad payload cannot take down the pool. [`Error`] covers the
//! pool-wide cases: bad configuration, an undersupplied or stalled collector,
//! dead worker threads and shutdown admission.

use core::time::Duration;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Pool-wide error type.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A pool or supervisor setting is out of range.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// A queue was closed a second time.
    #[error("Queue is already closed")]
    AlreadyClosed,

    /// A deadline-bounded dequeue gave up.
    #[error("Timed out after {waited:?} waiting for an item")]
    Timeout { waited: Duration },

    /// The collector deadline elapsed before every result arrived.
    #[error("Collector timed out with {received} of {expected} results")]
    CollectTimeout { received: usize, expected: usize },

    /// The result queue closed before every result arrived.
    #[error("Result queue closed with {received} of {expected} results")]
    ResultsShort { received: usize, expected: usize },

    /// The same task id was reported twice.
    #[error("Duplicate result for task {task_id}")]
    DuplicateResult { task_id: u64 },

    /// A worker thread died outside of the per-task panic guard.
    #[error("Worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },

    /// The producer thread died before closing the result queue.
    #[error("Producer thread panicked")]
    ProducerPanicked,

    /// The collector dropped its completion signal without reporting.
    #[error("Collector exited without signalling completion")]
    CollectorGone,

    /// Work was submitted after shutdown began.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// Handlers were still running when the drain deadline elapsed.
    #[error("Shutdown drain timed out with {remaining} handlers still active")]
    DrainTimeout { remaining: usize },
}
