//! Fixed-size group of worker threads draining a shared task queue.
//!
//! Each worker loops on [`BoundedQueue::dequeue`] until the queue reports
//! closed-and-empty, transforms every task it receives and pushes exactly one
//! [`TaskResult`] per task. Transform errors and panics are captured into the
//! result; a worker only stops when its input is exhausted.

use crate::{BoundedQueue, Error, Result, Task, TaskError, TaskResult, Transform};
use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
    thread::{self, JoinHandle},
};

/// Per-worker counters reported once the worker has exited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub processed: usize,
    pub failed: usize,
}

/// A running set of `size` workers.
///
/// The group size is fixed at spawn time. Completion is only observable
/// through [`wait`](Self::wait), which is the barrier callers must pass before
/// closing the result queue.
#[derive(Debug)]
pub struct WorkerGroup {
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl WorkerGroup {
    /// Spawns `size` named worker threads.
    ///
    /// Transient transform errors are retried until `max_attempts` runs have
    /// been made for a task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `size` or `max_attempts` is zero,
    /// or if the OS refuses to spawn a thread.
    pub fn spawn<X: Transform>(
        size: usize,
        max_attempts: u32,
        tasks: &BoundedQueue<Task>,
        results: &BoundedQueue<TaskResult>,
        transform: Arc<X>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig {
                reason: "worker group size must be greater than 0".to_string(),
            });
        }
        if max_attempts == 0 {
            return Err(Error::InvalidConfig {
                reason: "max_attempts must be greater than 0".to_string(),
            });
        }

        let mut handles = Vec::with_capacity(size);
        for worker_id in 0..size {
            let tasks = tasks.clone();
            let results = results.clone();
            let transform = Arc::clone(&transform);
            let handle = thread::Builder::new()
                .name(format!("taskline-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, &tasks, &results, &*transform, max_attempts))
                .map_err(|e| Error::InvalidConfig {
                    reason: format!("failed to spawn worker {worker_id}: {e}"),
                })?;
            handles.push(handle);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned {size} workers");

        Ok(Self { handles })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Blocks until every worker has exited.
    ///
    /// Workers exit once the task queue is closed and drained, so this only
    /// returns after the producer has closed it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerPanicked`] for the first worker thread that died
    /// abnormally. All threads are joined regardless.
    pub fn wait(self) -> Result<Vec<WorkerStats>> {
        let mut stats = Vec::with_capacity(self.handles.len());
        let mut first_err = None;

        for (worker_id, handle) in self.handles.into_iter().enumerate() {
            match handle.join() {
                Ok(s) => stats.push(s),
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {worker_id} thread panicked");
                    if first_err.is_none() {
                        first_err = Some(Error::WorkerPanicked { worker_id });
                    }
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(stats),
        }
    }
}

fn worker_loop<X: Transform + ?Sized>(
    worker_id: usize,
    tasks: &BoundedQueue<Task>,
    results: &BoundedQueue<TaskResult>,
    transform: &X,
    max_attempts: u32,
) -> WorkerStats {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    let mut stats = WorkerStats {
        worker_id,
        ..WorkerStats::default()
    };

    while let Some(task) = tasks.dequeue() {
        #[cfg(feature = "tracing")]
        tracing::debug!("Worker {worker_id} processing task {}: {}", task.id, task.payload);

        let result = process(worker_id, &task, transform, max_attempts);
        stats.processed += 1;
        if !result.is_ok() {
            stats.failed += 1;
        }
        results.enqueue(result);
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(
        "Worker {worker_id} stopped after {} tasks ({} failed)",
        stats.processed,
        stats.failed
    );

    stats
}

fn process<X: Transform + ?Sized>(
    worker_id: usize,
    task: &Task,
    transform: &X,
    max_attempts: u32,
) -> TaskResult {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let value = catch_unwind(AssertUnwindSafe(|| transform.apply(task)))
            .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(&*payload))));

        match value {
            Err(ref _e) if _e.is_retryable() && attempts < max_attempts => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    "Worker {worker_id} retrying task {} (attempt {attempts}/{max_attempts}): {_e}",
                    task.id
                );
            }
            value => {
                return TaskResult {
                    task_id: task.id,
                    value,
                    attempts,
                    worker_id,
                };
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
