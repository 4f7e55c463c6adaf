use core::time::Duration;
use std::io;
use taskline::CancellationToken;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;

pub const SHUTDOWN_NOTICE: &str = "server shutting down\n";

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disconnect {
    /// The peer closed its side.
    Peer,
    /// The server is shutting down and told the peer so.
    Shutdown,
}

pub fn acknowledgement(client_id: usize) -> String {
    format!("server [{client_id}]: received\n")
}

/// Serves one connection until the peer disconnects or `token` is cancelled.
///
/// Each read waits at most `poll_interval` and each acknowledgement is raced
/// against cancellation, so a peer that stops reading cannot hold the
/// handler past shutdown. The shutdown notice gets one more `poll_interval`;
/// failing to deliver it is logged, not returned.
///
/// # Errors
///
/// Read errors and failed acknowledgements while serving.
pub async fn handle_client<S>(
    client_id: usize,
    stream: S,
    token: CancellationToken,
    poll_interval: Duration,
) -> io::Result<Disconnect>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    loop {
        if token.is_cancelled() {
            tracing::info!("[client {client_id}] Closing for shutdown");
            match timeout(poll_interval, say_goodbye(&mut writer)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!("[client {client_id}] Failed to send shutdown notice: {e}");
                }
                Err(_elapsed) => {
                    tracing::warn!("[client {client_id}] Peer not reading; dropped shutdown notice");
                }
            }
            return Ok(Disconnect::Shutdown);
        }

        // `next_line` is cancel safe, so a timed-out read loses nothing.
        match timeout(poll_interval, lines.next_line()).await {
            Err(_elapsed) => {}
            Ok(Ok(Some(line))) => {
                tracing::info!("[client {client_id}] Message: {line}");
                let ack = acknowledgement(client_id);
                tokio::select! {
                    written = writer.write_all(ack.as_bytes()) => written?,
                    () = token.cancelled() => {
                        tracing::debug!("[client {client_id}] Acknowledgement cut short by shutdown");
                    }
                }
            }
            Ok(Ok(None)) => {
                tracing::info!("[client {client_id}] Disconnected");
                return Ok(Disconnect::Peer);
            }
            Ok(Err(e)) => return Err(e),
        }
    }
}

async fn say_goodbye<W: AsyncWrite + Unpin>(writer: &mut W) -> io::Result<()> {
    writer.write_all(SHUTDOWN_NOTICE.as_bytes()).await?;
    writer.shutdown().await
}
