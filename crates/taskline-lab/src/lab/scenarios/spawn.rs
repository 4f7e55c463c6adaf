//! Independent computations on scoped threads.

use super::ScenarioFuture;
use crate::lab::config::LabConfig;
use rand::Rng;
use std::thread;

const FACTORIAL_OF: u64 = 5;
const RANDOM_COUNT: usize = 5;
const SERIES_UP_TO: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSummary {
    pub factorial: Option<u64>,
    pub randoms: Vec<u32>,
    pub series_sum: u64,
}

/// `n!`, or `None` once it no longer fits in a `u64`.
pub fn factorial(n: u64) -> Option<u64> {
    (1..=n).try_fold(1u64, |acc, i| acc.checked_mul(i))
}

pub fn series_sum(n: u64) -> u64 {
    (1..=n).sum()
}

pub fn random_numbers(count: usize) -> Vec<u32> {
    let mut rng = rand::rng();
    (0..count).map(|_| rng.random_range(0..100)).collect()
}

/// Runs the three computations concurrently and joins them.
pub fn compute(factorial_of: u64, random_count: usize, series_up_to: u64) -> SpawnSummary {
    thread::scope(|s| {
        let fact = s.spawn(move || factorial(factorial_of));
        let randoms = s.spawn(move || random_numbers(random_count));
        let sum = s.spawn(move || series_sum(series_up_to));

        SpawnSummary {
            factorial: join(fact),
            randoms: join(randoms),
            series_sum: join(sum),
        }
    })
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

pub fn run(_config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        let summary = tokio::task::spawn_blocking(|| {
            compute(FACTORIAL_OF, RANDOM_COUNT, SERIES_UP_TO)
        })
        .await?;

        match summary.factorial {
            Some(f) => println!("Factorial of {FACTORIAL_OF} is {f}"),
            None => println!("Factorial of {FACTORIAL_OF} overflows u64"),
        }
        println!("Random numbers: {:?}", summary.randoms);
        println!("Sum of 1..={SERIES_UP_TO} is {}", summary.series_sum);
        Ok(())
    })
}
