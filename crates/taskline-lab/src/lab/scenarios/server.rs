use super::ScenarioFuture;
use crate::lab::config::LabConfig;
use crate::lab::server::{ServeOptions, serve, shutdown_signal};
use anyhow::Context;
use tokio::net::TcpListener;

pub fn run(config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;
        let addr = listener.local_addr()?;

        println!("Listening on {addr}");
        println!(
            "Connect with `nc {} {}` and type lines; Ctrl+C stops the server",
            addr.ip(),
            addr.port()
        );

        let options = ServeOptions {
            poll_interval: config.poll_interval,
            drain_timeout: config.drain_timeout,
        };
        let report = serve(listener, options, shutdown_signal()).await;

        println!(
            "Server stopped after {} connections ({})",
            report.accepted,
            if report.drained {
                "all drained"
            } else {
                "drain timed out"
            }
        );
        Ok(())
    })
}
