//! Blocking, bounded, multi-producer/multi-consumer queue.
//!
//! [`BoundedQueue`] is the handoff buffer between producers, workers and the
//! collector. It has three properties the rest of the crate leans on:
//!
//! - Delivery is FIFO per queue. With several consumers pulling concurrently
//!   there is no end-to-end ordering between what one side enqueued and what
//!   the other side observes downstream.
//! - [`dequeue`](BoundedQueue::dequeue) returns `None` only once the queue is
//!   closed *and* drained, so consumers can loop on it until the producer
//!   side is done.
//! - Closing twice or enqueuing after close is a programming error and panics.
//!   [`try_close`](BoundedQueue::try_close) exists for callers that need to
//!   detect a double close without unwinding.

use crate::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::{collections::VecDeque, sync::Arc, time::Instant};

struct State<T> {
    buf: VecDeque<T>,
    closed: bool,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

/// A cloneable handle to a bounded FIFO queue.
///
/// Every clone refers to the same buffer. Closing is explicit; dropping
/// handles does not close the queue.
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> core::fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("BoundedQueue")
            .field("len", &state.buf.len())
            .field("capacity", &self.shared.capacity)
            .field("closed", &state.closed)
            .finish()
    }
}

impl<T> BoundedQueue<T> {
    /// Creates an open queue holding at most `capacity` items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be greater than 0");
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    buf: VecDeque::with_capacity(capacity),
                    closed: false,
                }),
                not_empty: Condvar::new(),
                not_full: Condvar::new(),
                capacity,
            }),
        }
    }

    /// Appends `item`, blocking while the queue is full.
    ///
    /// # Panics
    ///
    /// Panics if the queue is closed, including when it gets closed while
    /// this call is waiting for space.
    pub fn enqueue(&self, item: T) {
        let mut state = self.shared.state.lock();
        loop {
            assert!(!state.closed, "enqueue on a closed queue");
            if state.buf.len() < self.shared.capacity {
                break;
            }
            self.shared.not_full.wait(&mut state);
        }
        state.buf.push_back(item);
        drop(state);
        self.shared.not_empty.notify_one();
    }

    /// Removes the oldest item, blocking until one is available.
    ///
    /// Returns `None` once the queue is closed and empty.
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.buf.pop_front() {
                drop(state);
                self.shared.not_full.notify_one();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            self.shared.not_empty.wait(&mut state);
        }
    }

    /// Like [`dequeue`](Self::dequeue), but gives up at `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if no item arrived and the queue was not
    /// closed before `deadline`.
    pub fn dequeue_until(&self, deadline: Instant) -> Result<Option<T>> {
        let started = Instant::now();
        let mut state = self.shared.state.lock();
        loop {
            if let Some(item) = state.buf.pop_front() {
                drop(state);
                self.shared.not_full.notify_one();
                return Ok(Some(item));
            }
            if state.closed {
                return Ok(None);
            }
            if self
                .shared
                .not_empty
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.buf.is_empty()
                && !state.closed
            {
                return Err(Error::Timeout {
                    waited: started.elapsed(),
                });
            }
        }
    }

    /// Removes the oldest item without blocking.
    pub fn try_dequeue(&self) -> Option<T> {
        let item = self.shared.state.lock().buf.pop_front();
        if item.is_some() {
            self.shared.not_full.notify_one();
        }
        item
    }

    /// Marks the queue closed and wakes every waiter.
    ///
    /// Items already buffered remain available to consumers.
    ///
    /// # Panics
    ///
    /// Panics if the queue was already closed.
    pub fn close(&self) {
        if self.try_close().is_err() {
            panic!("queue closed twice");
        }
    }

    /// Closes the queue, reporting a second close instead of panicking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyClosed`] if the queue was already closed.
    pub fn try_close(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(Error::AlreadyClosed);
        }
        state.closed = true;
        drop(state);
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }
}
