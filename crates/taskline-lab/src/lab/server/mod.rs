//! Line-oriented TCP server that stops gracefully.
//!
//! Every accepted connection is handed to a [`handler::handle_client`] task
//! admitted through a [`taskline::Supervisor`]. On a termination request the
//! accept loop ends, the shared token is cancelled and the server waits for
//! every handler to notice it, say goodbye and return.

mod handler;
mod listener;

pub use handler::*;
pub use listener::*;

use tokio::signal;

/// Resolves on Ctrl+C or, on unix, SIGTERM.
///
/// If a handler cannot be installed that source is ignored and the other one
/// still works.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");
}
