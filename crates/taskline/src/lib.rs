//! Bounded task distribution with ordered shutdown.
//!
//! `taskline` provides the pieces of a classic worker-pool pipeline and the
//! coordination needed to stop it cleanly:
//!
//! - [`BoundedQueue`]: blocking bounded MPMC queue with an explicit
//!   closed-and-empty signal.
//! - [`WorkerGroup`]: fixed number of worker threads applying a
//!   [`Transform`] to every [`Task`].
//! - [`Collector`]: single consumer that gathers exactly `N`
//!   [`TaskResult`]s and signals completion once.
//! - [`Pipeline`]: producer → workers → collector wired in the right order.
//! - [`Supervisor`]: cancellation token plus counted barrier for async
//!   connection handlers.
//! - [`Counter`]: racy, locked and atomic shared counters.
//!
//! ```
//! use taskline::{Pipeline, PoolConfig, Reverse, tasks_from};
//!
//! let pipeline = Pipeline::new(PoolConfig::default(), Reverse)?;
//! let report = pipeline.run(tasks_from(["Hello World", "Golang"]))?;
//!
//! let by_id = report.collected.by_id();
//! assert_eq!(by_id[&1].value.as_deref(), Ok("dlroW olleH"));
//! assert_eq!(by_id[&2].value.as_deref(), Ok("gnaloG"));
//! # Ok::<(), taskline::Error>(())
//! ```
//!
//! Results arrive in completion order. With more than one worker that is not
//! the submission order; key results by task id instead.

mod collector;
mod counter;
mod error;
mod pipeline;
mod queue;
mod shutdown;
mod task;
mod worker;

pub use crate::collector::*;
pub use crate::counter::*;
pub use crate::error::*;
pub use crate::pipeline::*;
pub use crate::queue::*;
pub use crate::shutdown::*;
pub use crate::task::*;
pub use crate::worker::*;

// Re-exported so handlers can name the token type without depending on
// `tokio-util` directly.
pub use tokio_util::sync::CancellationToken;
