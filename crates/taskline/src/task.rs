//! Work items, their results and the transforms that turn one into the other.

use core::fmt;

/// A unit of work: a caller-assigned id and the payload to transform.
///
/// Ids only need to be unique within one pipeline run; they do not have to be
/// contiguous or monotonic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Task {
    pub id: u64,
    pub payload: String,
}

impl Task {
    pub fn new(id: u64, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
        }
    }
}

/// Builds tasks with ids `1..=N` in iteration order.
pub fn tasks_from<I, S>(payloads: I) -> Vec<Task>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    payloads
        .into_iter()
        .zip(1..)
        .map(|(payload, id)| Task::new(id, payload))
        .collect()
}

/// Why a single task could not be transformed.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum TaskError {
    /// A failure that may succeed on another attempt.
    #[error("transient failure: {0}")]
    Transient(String),

    /// A failure that will not go away by retrying.
    #[error("failed: {0}")]
    Failed(String),

    /// The transform panicked. The worker survived; the task did not.
    #[error("transform panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The outcome of one [`Task`], tagged with the originating task id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskResult {
    pub task_id: u64,
    pub value: Result<String, TaskError>,
    /// How many times the transform ran for this task (at least 1).
    pub attempts: u32,
    /// Index of the worker that produced this result.
    pub worker_id: usize,
}

impl TaskResult {
    pub const fn is_ok(&self) -> bool {
        self.value.is_ok()
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Ok(value) => write!(f, "task {}: {value}", self.task_id),
            Err(err) => write!(f, "task {}: error: {err}", self.task_id),
        }
    }
}

/// A pure `Task -> value` function run by every worker in a group.
///
/// Implementations are shared across worker threads and must not rely on
/// shared mutable state. Errors are reported per task and never stop the
/// worker.
pub trait Transform: Send + Sync + 'static {
    /// Transforms one task.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] describing why this task failed.
    fn apply(&self, task: &Task) -> Result<String, TaskError>;
}

impl<F> Transform for F
where
    F: Fn(&Task) -> Result<String, TaskError> + Send + Sync + 'static,
{
    fn apply(&self, task: &Task) -> Result<String, TaskError> {
        self(task)
    }
}

/// Reverses the payload character by character.
///
/// Applying it twice yields the original payload.
#[derive(Clone, Copy, Debug, Default)]
pub struct Reverse;

impl Transform for Reverse {
    fn apply(&self, task: &Task) -> Result<String, TaskError> {
        Ok(task.payload.chars().rev().collect())
    }
}

/// Upper-cases the payload using Unicode case mapping.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uppercase;

impl Transform for Uppercase {
    fn apply(&self, task: &Task) -> Result<String, TaskError> {
        Ok(task.payload.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_an_involution() {
        for payload in ["Hello World", "", "a", "Синхронизация", "🦀 crab"] {
            let once = Reverse.apply(&Task::new(1, payload)).unwrap();
            let twice = Reverse.apply(&Task::new(1, once)).unwrap();
            assert_eq!(twice, payload);
        }
    }

    #[test]
    fn reverse_works_on_chars_not_bytes() {
        let out = Reverse.apply(&Task::new(1, "Мьютекс")).unwrap();
        assert_eq!(out, "скетюьМ");
    }

    #[test]
    fn uppercase_maps_unicode() {
        let out = Uppercase.apply(&Task::new(1, "straße мьютекс")).unwrap();
        assert_eq!(out, "STRASSE МЬЮТЕКС");
    }

    #[test]
    fn closures_are_transforms() {
        let double = |task: &Task| -> Result<String, TaskError> { Ok(task.payload.repeat(2)) };
        assert_eq!(double.apply(&Task::new(3, "ab")).unwrap(), "abab");
    }

    #[test]
    fn tasks_from_assigns_ids_from_one() {
        let tasks = tasks_from(["x", "y", "z"]);
        let ids: Vec<_> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(tasks[2].payload, "z");
    }

    #[test]
    fn only_transient_errors_retry() {
        assert!(TaskError::Transient("busy".into()).is_retryable());
        assert!(!TaskError::Failed("bad".into()).is_retryable());
        assert!(!TaskError::Panicked("boom".into()).is_retryable());
    }

    #[test]
    fn display_includes_task_id() {
        let ok = TaskResult {
            task_id: 4,
            value: Ok("gnaloG".into()),
            attempts: 1,
            worker_id: 0,
        };
        assert_eq!(ok.to_string(), "task 4: gnaloG");

        let err = TaskResult {
            value: Err(TaskError::Failed("empty payload".into())),
            ..ok
        };
        assert_eq!(err.to_string(), "task 4: error: failed: empty payload");
    }
}
