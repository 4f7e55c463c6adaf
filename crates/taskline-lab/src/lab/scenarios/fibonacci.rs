//! Producer/reader over a channel that the producer closes.

use super::ScenarioFuture;
use crate::lab::config::LabConfig;
use core::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

const COUNT: usize = 10;
const DELAY: Duration = Duration::from_millis(300);

/// Spawns a producer that sends the first `n` Fibonacci numbers, pausing
/// `delay` after each, then drops its sender.
///
/// The channel holds one value, so the producer runs at most one step ahead
/// of the reader.
pub fn fibonacci_stream(n: usize, delay: Duration) -> mpsc::Receiver<u64> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let (mut a, mut b) = (0u64, 1u64);
        for _ in 0..n {
            if tx.send(a).await.is_err() {
                tracing::debug!("Fibonacci reader went away");
                return;
            }
            (a, b) = (b, a.saturating_add(b));
            sleep(delay).await;
        }
    });
    rx
}

pub fn run(_config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        let mut rx = fibonacci_stream(COUNT, DELAY);
        while let Some(n) = rx.recv().await {
            println!("Received Fibonacci number: {n}");
        }
        println!("Channel closed, reader done");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reader_drains_until_closed() {
        let mut rx = fibonacci_stream(10, Duration::ZERO);
        let mut got = Vec::new();
        while let Some(n) = rx.recv().await {
            got.push(n);
        }
        assert_eq!(got, [0, 1, 1, 2, 3, 5, 8, 13, 21, 34]);
    }

    #[tokio::test]
    async fn empty_stream_closes_immediately() {
        let mut rx = fibonacci_stream(0, Duration::ZERO);
        assert_eq!(rx.recv().await, None);
    }
}
