use super::*;
use crate::{Reverse, TaskError, Uppercase, tasks_from};
use std::collections::HashSet;

fn config(workers: usize, queue_capacity: usize) -> PoolConfig {
    PoolConfig {
        workers,
        queue_capacity,
        max_attempts: 1,
        collect_timeout: Some(Duration::from_secs(10)),
    }
}

fn run_exactly_n_distinct_results(tasks: usize, workers: usize, queue_capacity: usize) {
    let pipeline = Pipeline::new(config(workers, queue_capacity), Reverse).unwrap();
    let input = tasks_from((0..tasks).map(|i| format!("payload-{i}")));
    let submitted: HashSet<u64> = input.iter().map(|t| t.id).collect();

    let report = pipeline.run(input).unwrap();

    assert_eq!(report.collected.len(), tasks);
    let received: HashSet<u64> = report
        .collected
        .results()
        .iter()
        .map(|r| r.task_id)
        .collect();
    assert_eq!(received.len(), tasks, "no duplicates");
    assert_eq!(received, submitted, "no omissions");

    let processed: usize = report.workers.iter().map(|w| w.processed).sum();
    assert_eq!(processed, tasks);
    assert_eq!(report.workers.len(), workers);
}

#[test]
fn every_task_yields_exactly_one_result() {
    for tasks in [0, 1, 7, 100] {
        for workers in [1, 2, 4, 8] {
            for queue_capacity in [1, 3, 16] {
                run_exactly_n_distinct_results(tasks, workers, queue_capacity);
            }
        }
    }
}

#[test]
fn zero_tasks_completes_with_empty_result_set() {
    let pipeline = Pipeline::new(PoolConfig::default(), Reverse).unwrap();
    let report = pipeline.run(Vec::new()).unwrap();
    assert!(report.collected.is_empty());
    assert!(report.workers.iter().all(|w| w.processed == 0));
}

#[test]
fn reverses_reference_inputs() {
    let pipeline = Pipeline::new(config(3, 3), Reverse).unwrap();
    let report = pipeline
        .run(tasks_from(["Hello World", "Golang", "Concurrency"]))
        .unwrap();

    let by_id = report.collected.by_id();
    assert_eq!(by_id.len(), 3);
    assert_eq!(by_id[&1].value, Ok("dlroW olleH".to_string()));
    assert_eq!(by_id[&2].value, Ok("gnaloG".to_string()));
    assert_eq!(by_id[&3].value, Ok("ycnerrucnoC".to_string()));
}

#[test]
fn single_worker_preserves_submission_order() {
    let pipeline = Pipeline::new(config(1, 2), Reverse).unwrap();
    let report = pipeline
        .run(tasks_from((0..50).map(|i| i.to_string())))
        .unwrap();

    let ids: Vec<u64> = report
        .collected
        .results()
        .iter()
        .map(|r| r.task_id)
        .collect();
    let expected: Vec<u64> = (1..=50).collect();
    assert_eq!(ids, expected);
}

#[test]
fn per_task_errors_do_not_stop_the_pool() {
    let transform = |task: &Task| -> core::result::Result<String, TaskError> {
        if task.payload.is_empty() {
            Err(TaskError::Failed("empty payload".to_string()))
        } else {
            Ok(task.payload.to_uppercase())
        }
    };
    let pipeline = Pipeline::new(config(2, 2), transform).unwrap();
    let report = pipeline.run(tasks_from(["a", "", "b", "", "c"])).unwrap();

    assert_eq!(report.collected.len(), 5);
    let failed: Vec<u64> = report.collected.failures().map(|r| r.task_id).collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.contains(&2) && failed.contains(&4));
    assert_eq!(report.workers.iter().map(|w| w.failed).sum::<usize>(), 2);
}

#[test]
fn stalled_transform_hits_the_collect_timeout() {
    let slow = |task: &Task| -> core::result::Result<String, TaskError> {
        thread::sleep(Duration::from_millis(300));
        Ok(task.payload.clone())
    };
    let pipeline = Pipeline::new(
        PoolConfig {
            workers: 1,
            queue_capacity: 1,
            max_attempts: 1,
            collect_timeout: Some(Duration::from_millis(50)),
        },
        slow,
    )
    .unwrap();

    let start = Instant::now();
    let err = pipeline.run(tasks_from(["a", "b", "c"])).unwrap_err();
    assert!(matches!(
        err,
        Error::CollectTimeout {
            received: 0,
            expected: 3
        }
    ));
    assert!(start.elapsed() < Duration::from_millis(250));
}

#[test]
fn pipeline_can_run_repeatedly() {
    let pipeline = Pipeline::new(config(4, 4), Reverse).unwrap();
    for round in 0..3 {
        let report = pipeline
            .run(tasks_from((0..20).map(|i| format!("{round}-{i}"))))
            .unwrap();
        assert_eq!(report.collected.len(), 20);
    }
}

#[test]
fn invalid_configs_are_rejected() {
    let bad = [
        PoolConfig {
            workers: 0,
            ..PoolConfig::default()
        },
        PoolConfig {
            queue_capacity: 0,
            ..PoolConfig::default()
        },
        PoolConfig {
            max_attempts: 0,
            ..PoolConfig::default()
        },
        PoolConfig {
            collect_timeout: Some(Duration::ZERO),
            ..PoolConfig::default()
        },
    ];
    for config in bad {
        assert!(matches!(
            Pipeline::new(config, Reverse),
            Err(Error::InvalidConfig { .. })
        ));
    }
}

#[test]
fn transform_is_swappable() {
    let payloads = ["Hello World", "Mutex"];
    let upper = Pipeline::new(config(2, 2), Uppercase)
        .unwrap()
        .run(tasks_from(payloads))
        .unwrap();
    let reversed = Pipeline::new(config(2, 2), Reverse)
        .unwrap()
        .run(tasks_from(payloads))
        .unwrap();

    assert_eq!(upper.collected.by_id()[&1].value.as_deref(), Ok("HELLO WORLD"));
    assert_eq!(upper.collected.by_id()[&2].value.as_deref(), Ok("MUTEX"));
    assert_eq!(reversed.collected.by_id()[&2].value.as_deref(), Ok("xetuM"));
}

#[tokio::test]
async fn run_works_on_a_runtime_thread() {
    let pipeline = Pipeline::new(config(3, 2), Reverse).unwrap();
    let report = pipeline
        .run(tasks_from((0..25).map(|i| format!("item-{i}"))))
        .unwrap();
    assert_eq!(report.collected.len(), 25);
}
