//! End-to-end task distribution: producer, worker group and collector.
//!
//! A [`Pipeline`] run wires the pieces together in a fixed order:
//!
//! 1. Spawn the [`WorkerGroup`] over a fresh task queue and result queue.
//! 2. On a producer thread, enqueue all tasks, close the task queue, wait on
//!    the worker barrier and only then close the result queue.
//! 3. Run the [`Collector`] for exactly `N` results on the calling thread.
//!
//! Nothing in a run touches the tokio runtime, so [`Pipeline::run`] may be
//! called from any thread. It does block, so async callers should still move
//! it onto `spawn_blocking`.
//!
//! If the collector fails (deadline, short count), the rest of the result
//! stream is drained and discarded on a detached thread so workers blocked on
//! a full result queue can still unwind.

use crate::{
    BoundedQueue, Collected, Collector, Error, Result, Task, TaskResult, Transform, WorkerGroup,
    WorkerStats,
};
use core::time::Duration;
use std::{sync::Arc, thread, time::Instant};

/// Sizing and failure policy for a [`Pipeline`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads. Fixed for the lifetime of a run.
    pub workers: usize,
    /// Capacity of both the task queue and the result queue.
    pub queue_capacity: usize,
    /// Transform runs per task, including the first.
    pub max_attempts: u32,
    /// Upper bound on the collection phase. `None` waits forever.
    pub collect_timeout: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            queue_capacity: 8,
            max_attempts: 1,
            collect_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl PoolConfig {
    /// Checks every field is within range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig {
                reason: "workers must be greater than 0".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig {
                reason: "queue_capacity must be greater than 0".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig {
                reason: "max_attempts must be greater than 0".to_string(),
            });
        }
        if self.collect_timeout == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig {
                reason: "collect_timeout must be non-zero when set".to_string(),
            });
        }
        Ok(())
    }
}

/// Outcome of a successful [`Pipeline::run`].
#[derive(Clone, Debug)]
pub struct Report {
    pub collected: Collected,
    pub workers: Vec<WorkerStats>,
    pub elapsed: Duration,
}

/// A reusable task pipeline bound to one [`Transform`].
///
/// Every [`run`](Self::run) spawns its own threads and queues; nothing is
/// shared between runs except the transform.
#[derive(Debug)]
pub struct Pipeline<X> {
    config: PoolConfig,
    transform: Arc<X>,
}

impl<X: Transform> Pipeline<X> {
    /// Validates `config` and binds `transform`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` is out of range.
    pub fn new(config: PoolConfig, transform: X) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transform: Arc::new(transform),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Processes every task and returns exactly one result per task.
    ///
    /// Result order follows arrival at the collector, which only matches
    /// submission order when `workers == 1`. Use [`Collected::by_id`] for a
    /// stable view.
    ///
    /// Blocks the calling thread until the run is over. It is safe on a tokio
    /// worker thread, but stalls that worker; prefer `spawn_blocking`.
    ///
    /// # Errors
    ///
    /// - [`Error::CollectTimeout`] / [`Error::ResultsShort`] /
    ///   [`Error::DuplicateResult`] from the collector.
    /// - [`Error::WorkerPanicked`] / [`Error::ProducerPanicked`] if a pool
    ///   thread died.
    /// - [`Error::InvalidConfig`] if a thread could not be spawned.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(workers = self.config.workers)))]
    pub fn run<I>(&self, tasks: I) -> Result<Report>
    where
        I: IntoIterator<Item = Task>,
    {
        let start = Instant::now();
        let tasks: Vec<Task> = tasks.into_iter().collect();
        let expected = tasks.len();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Running {expected} tasks on {} workers",
            self.config.workers
        );

        let task_q = BoundedQueue::<Task>::new(self.config.queue_capacity);
        let result_q = BoundedQueue::<TaskResult>::new(self.config.queue_capacity);

        let group = WorkerGroup::spawn(
            self.config.workers,
            self.config.max_attempts,
            &task_q,
            &result_q,
            Arc::clone(&self.transform),
        )
        .inspect_err(|_| task_q.close())?;

        let mut collector = Collector::new(result_q.clone(), expected);
        if let Some(timeout) = self.config.collect_timeout {
            collector = collector.with_timeout(timeout);
        }

        let producer = {
            let task_q = task_q.clone();
            let result_q = result_q.clone();
            thread::Builder::new()
                .name("taskline-producer".to_string())
                .spawn(move || {
                    for task in tasks {
                        task_q.enqueue(task);
                    }
                    task_q.close();
                    let stats = group.wait();
                    result_q.close();
                    stats
                })
        };
        let producer = producer.map_err(|e| {
            // Workers already spawned exit once the task queue is closed.
            task_q.close();
            Error::InvalidConfig {
                reason: format!("failed to spawn producer: {e}"),
            }
        })?;

        let collected = match collector.collect() {
            Ok(collected) => collected,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Collector failed: {err}; discarding remaining results");
                discard_remaining(result_q);
                return Err(err);
            }
        };

        let workers = producer.join().map_err(|_| Error::ProducerPanicked)??;

        let elapsed = start.elapsed();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Processed {} tasks ({} failed) in {:?}",
            collected.len(),
            collected.failures().count(),
            elapsed
        );

        Ok(Report {
            collected,
            workers,
            elapsed,
        })
    }
}

fn discard_remaining(results: BoundedQueue<TaskResult>) {
    let spawned = thread::Builder::new()
        .name("taskline-drain".to_string())
        .spawn(move || while results.dequeue().is_some() {});
    if let Err(_e) = spawned {
        #[cfg(feature = "tracing")]
        tracing::error!("Failed to spawn result drain: {_e}");
    }
}

#[cfg(test)]
mod tests;
