use super::ScenarioFuture;
use crate::lab::config::LabConfig;
use taskline::{Pipeline, PoolConfig, Report, Reverse, tasks_from};

pub const INPUTS: [&str; 8] = [
    "Hello World",
    "Golang",
    "Concurrency",
    "Worker Pool",
    "Goroutines",
    "Channels",
    "Synchronization",
    "Mutex",
];

/// Reverses every input on a fresh worker pool sized by `config`.
///
/// # Errors
///
/// Any pipeline error: invalid config, collect timeout, short result count
/// or a crashed worker.
pub fn reverse_all(config: PoolConfig, inputs: &[&str]) -> taskline::Result<Report> {
    Pipeline::new(config, Reverse)?.run(tasks_from(inputs.iter().copied()))
}

pub fn run(config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        let pool = config.pool;
        println!("Workers: {}", pool.workers);
        println!("Tasks:   {}\n", INPUTS.len());

        let report = tokio::task::spawn_blocking(move || reverse_all(pool, &INPUTS)).await??;

        println!("Results (completion order):");
        for result in report.collected.results() {
            println!("  {result} (worker {})", result.worker_id);
        }
        for stats in &report.workers {
            println!(
                "Worker {} processed {} tasks ({} failed)",
                stats.worker_id, stats.processed, stats.failed
            );
        }
        println!("Pool finished in {:?}", report.elapsed);
        Ok(())
    })
}
