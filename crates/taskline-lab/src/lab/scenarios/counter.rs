use super::ScenarioFuture;
use crate::lab::config::LabConfig;
use taskline::{AtomicCounter, Counter, LockedCounter, RacyCounter, hammer};

const THREADS: usize = 5;
const PER_THREAD: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterTotals {
    pub racy: u64,
    pub locked: u64,
    pub atomic: u64,
}

pub fn count_all(threads: usize, per_thread: usize) -> CounterTotals {
    CounterTotals {
        racy: hammer(&RacyCounter::default(), threads, per_thread),
        locked: hammer(&LockedCounter::default(), threads, per_thread),
        atomic: hammer(&AtomicCounter::default(), threads, per_thread),
    }
}

pub fn run(_config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        let totals = tokio::task::spawn_blocking(|| count_all(THREADS, PER_THREAD)).await?;
        let expected = (THREADS * PER_THREAD) as u64;

        println!("{THREADS} threads x {PER_THREAD} increments, expected {expected}");
        println!(
            "  racy:   {} ({} lost)",
            totals.racy,
            expected - totals.racy
        );
        println!("  locked: {}", totals.locked);
        println!("  atomic: {}", totals.atomic);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synchronized_counters_are_exact() {
        let totals = count_all(THREADS, PER_THREAD);
        assert_eq!(totals.locked, 5000);
        assert_eq!(totals.atomic, 5000);
        assert!(totals.racy <= 5000);
    }

    #[test]
    fn counters_share_one_interface() {
        let counters: [&dyn Counter; 3] = [
            &RacyCounter::default(),
            &LockedCounter::default(),
            &AtomicCounter::default(),
        ];
        for c in counters {
            // Single-threaded, so even the racy counter is exact.
            assert_eq!(hammer(c, 1, 10), 10);
        }
    }
}
