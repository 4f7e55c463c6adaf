use crate::lab::scenarios::Scenario;
use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use taskline::PoolConfig;

/// Runtime configuration for the `taskline-lab` binary.
///
/// Every value can come from a CLI flag or an environment variable (a `.env`
/// file in the working directory is loaded first). Defaults match the
/// reference exercise: three workers, a 1 s handler poll interval and a line
/// server on port 8080.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskline-lab",
    version,
    about = "Concurrency scenarios: worker pool, counters, channels and a gracefully stopping TCP server"
)]
pub struct CliArgs {
    /// Number of worker threads in the task pipeline.
    ///
    /// Environment variable: `TASKLINE_WORKERS`
    #[arg(long, env = "TASKLINE_WORKERS", default_value_t = 3)]
    pub workers: usize,

    /// Capacity of the task and result queues.
    ///
    /// Producers block once the task queue is full; workers block once the
    /// result queue is full.
    ///
    /// Environment variable: `TASKLINE_QUEUE_CAPACITY`
    #[arg(long, env = "TASKLINE_QUEUE_CAPACITY", default_value_t = 8)]
    pub queue_capacity: usize,

    /// Transform runs per task, including the first attempt.
    ///
    /// Environment variable: `TASKLINE_MAX_ATTEMPTS`
    #[arg(long, env = "TASKLINE_MAX_ATTEMPTS", default_value_t = 1)]
    pub max_attempts: u32,

    /// Seconds the collector waits for all results. `0` waits forever.
    ///
    /// Environment variable: `TASKLINE_COLLECT_TIMEOUT_SECS`
    #[arg(long, env = "TASKLINE_COLLECT_TIMEOUT_SECS", default_value_t = 30)]
    pub collect_timeout_secs: u64,

    /// Address of the TCP line server.
    ///
    /// Environment variable: `TASKLINE_LISTEN_ADDR`
    #[arg(long, env = "TASKLINE_LISTEN_ADDR", default_value_t = String::from("127.0.0.1:8080"))]
    pub listen_addr: String,

    /// Longest a connection handler blocks before re-checking for shutdown.
    ///
    /// Environment variable: `TASKLINE_POLL_INTERVAL_MS`
    #[arg(long, env = "TASKLINE_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Seconds to wait for connection handlers during shutdown. `0` waits
    /// forever.
    ///
    /// Environment variable: `TASKLINE_DRAIN_TIMEOUT_SECS`
    #[arg(long, env = "TASKLINE_DRAIN_TIMEOUT_SECS", default_value_t = 10)]
    pub drain_timeout_secs: u64,

    /// Run a single scenario and exit instead of showing the menu.
    #[arg(long, value_enum)]
    pub scenario: Option<Scenario>,
}

#[derive(Debug, Clone)]
pub struct LabConfig {
    pub pool: PoolConfig,
    pub listen_addr: String,
    pub poll_interval: Duration,
    pub drain_timeout: Option<Duration>,
    pub scenario: Option<Scenario>,
}

impl TryFrom<CliArgs> for LabConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.workers == 0 {
            bail!("TASKLINE_WORKERS must be greater than 0");
        }
        if args.queue_capacity == 0 {
            bail!("TASKLINE_QUEUE_CAPACITY must be greater than 0");
        }
        if args.max_attempts == 0 {
            bail!("TASKLINE_MAX_ATTEMPTS must be greater than 0");
        }
        if args.poll_interval_ms == 0 {
            bail!("TASKLINE_POLL_INTERVAL_MS must be greater than 0");
        }

        let pool = PoolConfig {
            workers: args.workers,
            queue_capacity: args.queue_capacity,
            max_attempts: args.max_attempts,
            collect_timeout: non_zero_secs(args.collect_timeout_secs),
        };
        pool.validate()?;

        Ok(Self {
            pool,
            listen_addr: args.listen_addr,
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            drain_timeout: non_zero_secs(args.drain_timeout_secs),
            scenario: args.scenario,
        })
    }
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            listen_addr: String::from("127.0.0.1:8080"),
            poll_interval: taskline::DEFAULT_POLL_INTERVAL,
            drain_timeout: Some(Duration::from_secs(10)),
            scenario: None,
        }
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
