use super::handler::handle_client;
use core::time::Duration;
use taskline::{Error, Supervisor};
use tokio::net::TcpListener;
use tokio::time::sleep;

/// Back-off after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServeReport {
    /// Connections accepted over the server's lifetime.
    pub accepted: usize,
    /// Whether every handler exited before the drain timeout.
    pub drained: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    pub poll_interval: Duration,
    pub drain_timeout: Option<Duration>,
}

/// Accepts connections on `listener` until `shutdown` resolves, then stops
/// accepting, cancels every handler and waits for them to drain.
///
/// Client ids are assigned sequentially from 1 in accept order.
pub async fn serve<F>(listener: TcpListener, options: ServeOptions, shutdown: F) -> ServeReport
where
    F: Future<Output = ()>,
{
    let supervisor = Supervisor::new();
    let mut accepted = 0usize;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            conn = listener.accept() => match conn {
                Ok((stream, peer)) => {
                    accepted += 1;
                    let client_id = accepted;
                    tracing::info!("[client {client_id}] Connected from {peer}");

                    let token = supervisor.token();
                    let admitted = supervisor.spawn(async move {
                        if let Err(e) =
                            handle_client(client_id, stream, token, options.poll_interval).await
                        {
                            tracing::warn!("[client {client_id}] Connection error: {e}");
                        }
                    });
                    if let Err(e) = admitted {
                        tracing::warn!("[client {client_id}] Rejected: {e}");
                    }
                }
                Err(e) => {
                    tracing::error!("Accept failed: {e}");
                    sleep(ACCEPT_RETRY_DELAY).await;
                }
            },
        }
    }

    drop(listener);
    tracing::info!("Stopped accepting; {} connections active", supervisor.active());

    let drained = match supervisor.shutdown(options.drain_timeout).await {
        Ok(()) => true,
        Err(Error::DrainTimeout { remaining }) => {
            tracing::warn!("Abandoning {remaining} connections that did not close in time");
            false
        }
        Err(e) => {
            tracing::error!("Shutdown failed: {e}");
            false
        }
    };

    ServeReport { accepted, drained }
}
