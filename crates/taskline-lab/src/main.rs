#![doc = include_str!("../README.md")]

mod lab;

use clap::Parser;
use lab::config::{CliArgs, LabConfig};
use lab::menu::run_menu;
use lab::scenarios::run_scenario;
use lab::telemetry::init_telemetry;
use tokio::io::BufReader;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = LabConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    match config.scenario {
        Some(scenario) => run_scenario(scenario, &config).await,
        None => {
            let stats = run_menu(BufReader::new(tokio::io::stdin()), &config).await?;
            tracing::debug!("Menu finished: {stats:?}");
            Ok(())
        }
    }
}

fn log_startup_info(config: &LabConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting taskline lab with full config: {config:#?}");
    } else {
        tracing::info!(
            "Starting taskline lab with {} workers",
            config.pool.workers
        );
    }
}
