//! Shared counters for the concurrent-increment exercise.
//!
//! Three [`Counter`]s with the same interface and different guarantees:
//!
//! - [`RacyCounter`] performs the increment as a separate load and store.
//!   Concurrent increments can overwrite each other, so updates get lost. The
//!   individual operations are atomic, so this is a logic race, not undefined
//!   behaviour.
//! - [`LockedCounter`] guards the value with a single mutex.
//! - [`AtomicCounter`] uses a single read-modify-write instruction.
//!
//! Counters are owned values shared by reference; there is no global state.

use parking_lot::Mutex;
use portable_atomic::{AtomicU64, Ordering};
use std::thread;

pub trait Counter: Sync {
    fn increment(&self);
    fn get(&self) -> u64;
}

#[derive(Debug, Default)]
pub struct RacyCounter {
    value: AtomicU64,
}

impl Counter for RacyCounter {
    fn increment(&self) {
        let current = self.value.load(Ordering::Relaxed);
        // Widen the window between read and write so lost updates show up
        // even on lightly loaded machines.
        thread::yield_now();
        self.value.store(current + 1, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct LockedCounter {
    value: Mutex<u64>,
}

impl Counter for LockedCounter {
    fn increment(&self) {
        *self.value.lock() += 1;
    }

    fn get(&self) -> u64 {
        *self.value.lock()
    }
}

#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicU64,
}

impl Counter for AtomicCounter {
    fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Increments `counter` `per_thread` times from each of `threads` scoped
/// threads and returns the final value.
pub fn hammer<C: Counter + ?Sized>(counter: &C, threads: usize, per_thread: usize) -> u64 {
    thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                for _ in 0..per_thread {
                    counter.increment();
                }
            });
        }
    });
    counter.get()
}
