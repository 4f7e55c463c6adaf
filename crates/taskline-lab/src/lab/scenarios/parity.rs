//! A generator, a parity checker and a coordinator that `select!`s over the
//! checker's output, both completion signals and an idle timeout.

use super::ScenarioFuture;
use crate::lab::config::LabConfig;
use core::time::Duration;
use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;

const COUNT: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct ParityTiming {
    /// Pause after each generated number.
    pub emit_every: Duration,
    /// Simulated cost of classifying one number.
    pub check_cost: Duration,
    /// Coordinator gives up after this long without any event.
    pub idle_timeout: Duration,
}

impl Default for ParityTiming {
    fn default() -> Self {
        Self {
            emit_every: Duration::from_millis(500),
            check_cost: Duration::from_millis(200),
            idle_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Default)]
pub struct ParityReport {
    pub lines: Vec<String>,
    pub timed_out: bool,
}

pub fn classify(n: u32) -> String {
    if n % 2 == 0 {
        format!("{n} is even")
    } else {
        format!("{n} is odd")
    }
}

async fn generate(
    count: usize,
    pause: Duration,
    tx: mpsc::Sender<u32>,
    done: oneshot::Sender<()>,
) {
    for _ in 0..count {
        let n = rand::rng().random_range(0..100);
        if tx.send(n).await.is_err() {
            return;
        }
        sleep(pause).await;
    }
    // Closes the checker's input before reporting completion.
    drop(tx);
    let _ = done.send(());
}

async fn check(
    mut rx: mpsc::Receiver<u32>,
    tx: mpsc::Sender<String>,
    cost: Duration,
    done: oneshot::Sender<()>,
) {
    while let Some(n) = rx.recv().await {
        if tx.send(classify(n)).await.is_err() {
            return;
        }
        sleep(cost).await;
    }
    let _ = done.send(());
}

pub async fn coordinate(count: usize, timing: ParityTiming) -> ParityReport {
    let (num_tx, num_rx) = mpsc::channel(1);
    let (line_tx, mut line_rx) = mpsc::channel(1);
    let (gen_done_tx, mut gen_done) = oneshot::channel();
    let (check_done_tx, mut check_done) = oneshot::channel();

    tokio::spawn(generate(count, timing.emit_every, num_tx, gen_done_tx));
    tokio::spawn(check(num_rx, line_tx, timing.check_cost, check_done_tx));

    let mut report = ParityReport::default();
    let (mut generating, mut checking) = (true, true);

    while generating || checking {
        tokio::select! {
            biased;
            Some(line) = line_rx.recv() => {
                println!("  {line}");
                report.lines.push(line);
            }
            _ = &mut gen_done, if generating => {
                println!("[generator finished]");
                generating = false;
            }
            _ = &mut check_done, if checking => {
                println!("[parity checker finished]");
                checking = false;
            }
            () = sleep(timing.idle_timeout) => {
                println!("Timed out waiting for data");
                tracing::warn!("Parity coordinator idle for {:?}", timing.idle_timeout);
                report.timed_out = true;
                break;
            }
        }
    }

    while let Ok(line) = line_rx.try_recv() {
        println!("  {line}");
        report.lines.push(line);
    }
    report
}

pub fn run(_config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        let report = coordinate(COUNT, ParityTiming::default()).await;
        println!(
            "Classified {} numbers{}",
            report.lines.len(),
            if report.timed_out { " before timing out" } else { "" }
        );
        Ok(())
    })
}
