//! Console logging for the lab binary.
//!
//! Diagnostics go through `tracing` and are printed by a
//! `tracing_subscriber::fmt` layer to stderr, filtered by `RUST_LOG`
//! (default `info`). Scenario output meant for the user is written to stdout
//! separately so the two never interleave mid-line.
//!
//! ```bash
//! RUST_LOG=taskline=debug,taskline_lab=debug cargo run -p taskline-lab
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true),
        )
        .try_init()?;
    Ok(())
}
