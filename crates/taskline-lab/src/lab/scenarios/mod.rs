//! Named scenarios and the lookup table the menu dispatches through.
//!
//! Every scenario is an entry in [`SCENARIOS`]: a menu number, a title and a
//! handler. Blocking scenarios (threads, the worker pool) run on tokio's
//! blocking pool; async ones run directly on the runtime.

pub mod calculator;
pub mod counter;
pub mod fibonacci;
pub mod parity;
pub mod pool;
pub mod server;
pub mod spawn;

use crate::lab::config::LabConfig;
use futures::future::BoxFuture;

pub type ScenarioFuture = BoxFuture<'static, anyhow::Result<()>>;
pub type ScenarioFn = fn(LabConfig) -> ScenarioFuture;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Scenario {
    Spawn,
    Fibonacci,
    Parity,
    Counter,
    Calculator,
    Pool,
    All,
    Server,
}

pub struct Entry {
    pub number: u8,
    pub scenario: Scenario,
    pub title: &'static str,
    pub run: ScenarioFn,
    /// Whether `all` includes this scenario.
    pub batch: bool,
}

pub static SCENARIOS: &[Entry] = &[
    Entry {
        number: 1,
        scenario: Scenario::Spawn,
        title: "Spawn parallel computations",
        run: spawn::run,
        batch: true,
    },
    Entry {
        number: 2,
        scenario: Scenario::Fibonacci,
        title: "Stream Fibonacci numbers through a channel",
        run: fibonacci::run,
        batch: true,
    },
    Entry {
        number: 3,
        scenario: Scenario::Parity,
        title: "Select over several channels with a timeout",
        run: parity::run,
        batch: true,
    },
    Entry {
        number: 4,
        scenario: Scenario::Counter,
        title: "Shared counter: racy, locked and atomic",
        run: counter::run,
        batch: true,
    },
    Entry {
        number: 5,
        scenario: Scenario::Calculator,
        title: "Multithreaded calculator service",
        run: calculator::run,
        batch: true,
    },
    Entry {
        number: 6,
        scenario: Scenario::Pool,
        title: "Worker pool reversing strings",
        run: pool::run,
        batch: true,
    },
    Entry {
        number: 7,
        scenario: Scenario::All,
        title: "Run scenarios 1-6 in order",
        run: run_all,
        batch: false,
    },
    Entry {
        number: 8,
        scenario: Scenario::Server,
        title: "TCP line server with graceful shutdown (Ctrl+C to stop)",
        run: server::run,
        batch: false,
    },
];

impl Scenario {
    pub fn from_number(number: u8) -> Option<Self> {
        SCENARIOS
            .iter()
            .find(|e| e.number == number)
            .map(|e| e.scenario)
    }

    pub fn entry(self) -> &'static Entry {
        SCENARIOS
            .iter()
            .find(|e| e.scenario == self)
            .unwrap_or_else(|| unreachable!("every scenario has a table entry"))
    }
}

/// Runs `scenario` to completion.
///
/// # Errors
///
/// Propagates the scenario's own failure (bind errors, pipeline errors, ...).
pub async fn run_scenario(scenario: Scenario, config: &LabConfig) -> anyhow::Result<()> {
    let entry = scenario.entry();
    println!("\n=== {}: {} ===", entry.number, entry.title);
    tracing::debug!("Running scenario {scenario:?}");
    (entry.run)(config.clone()).await
}

fn run_all(config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        for entry in SCENARIOS.iter().filter(|e| e.batch) {
            run_scenario(entry.scenario, &config).await?;
        }
        println!("\nAll scenarios completed");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_scenario_has_exactly_one_entry() {
        use clap::ValueEnum;

        for scenario in Scenario::value_variants() {
            let count = SCENARIOS.iter().filter(|e| e.scenario == *scenario).count();
            assert_eq!(count, 1, "{scenario:?}");
        }
        let numbers: HashSet<u8> = SCENARIOS.iter().map(|e| e.number).collect();
        assert_eq!(numbers.len(), SCENARIOS.len());
        assert!(!numbers.contains(&0), "0 is reserved for exit");
    }

    #[test]
    fn numbers_map_to_scenarios() {
        assert_eq!(Scenario::from_number(6), Some(Scenario::Pool));
        assert_eq!(Scenario::from_number(8), Some(Scenario::Server));
        assert_eq!(Scenario::from_number(0), None);
        assert_eq!(Scenario::from_number(42), None);
    }

    #[test]
    fn batch_excludes_interactive_and_recursive_entries() {
        assert!(!Scenario::All.entry().batch);
        assert!(!Scenario::Server.entry().batch);
        assert!(Scenario::Counter.entry().batch);
    }
}
