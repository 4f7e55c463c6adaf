//! Request/reply over a shared bounded queue.
//!
//! A fixed set of server threads pull [`CalcRequest`]s from one
//! [`BoundedQueue`]; every request carries its own one-shot reply channel.
//! Clients block on their reply, so no client can observe another's answer.

use super::ScenarioFuture;
use crate::lab::config::LabConfig;
use core::str::FromStr;
use std::thread;
use taskline::BoundedQueue;
use tokio::sync::oneshot;

const SERVERS: usize = 3;
const QUEUE_CAPACITY: usize = 10;

const REQUESTS: &[(&str, f64, f64)] = &[
    ("+", 10.0, 5.0),
    ("-", 20.0, 8.0),
    ("*", 7.0, 6.0),
    ("/", 100.0, 4.0),
    ("+", 15.5, 4.5),
    ("*", 3.5, 2.0),
    ("/", 50.0, 2.0),
    ("-", 100.0, 25.0),
    ("/", 1.0, 0.0),
    ("%", 9.0, 4.0),
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown operator: {0:?}")]
    UnknownOperator(String),
    #[error("calculator stopped before replying")]
    NoReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl FromStr for Op {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Add),
            "-" => Ok(Self::Sub),
            "*" => Ok(Self::Mul),
            "/" => Ok(Self::Div),
            other => Err(CalcError::UnknownOperator(other.to_owned())),
        }
    }
}

pub fn evaluate(op: &str, a: f64, b: f64) -> Result<f64, CalcError> {
    match op.parse()? {
        Op::Add => Ok(a + b),
        Op::Sub => Ok(a - b),
        Op::Mul => Ok(a * b),
        Op::Div if b == 0.0 => Err(CalcError::DivisionByZero),
        Op::Div => Ok(a / b),
    }
}

pub struct CalcRequest {
    pub op: String,
    pub a: f64,
    pub b: f64,
    pub reply: oneshot::Sender<Result<f64, CalcError>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalcReply {
    pub client_id: usize,
    pub op: String,
    pub a: f64,
    pub b: f64,
    pub result: Result<f64, CalcError>,
}

/// Serves requests until the queue is closed and drained. Returns how many
/// requests this server answered.
fn serve(requests: &BoundedQueue<CalcRequest>) -> usize {
    let mut served = 0;
    while let Some(req) = requests.dequeue() {
        let result = evaluate(&req.op, req.a, req.b);
        if let Err(e) = &result {
            tracing::debug!("Request {} {} {} failed: {e}", req.a, req.op, req.b);
        }
        // The client may have given up; nothing to do then.
        let _ = req.reply.send(result);
        served += 1;
    }
    served
}

/// Runs `servers` calculator threads and one client thread per request, then
/// closes the queue once every client has its reply.
///
/// Replies are returned in client order.
pub fn calculate(
    servers: usize,
    capacity: usize,
    requests: &[(&str, f64, f64)],
) -> Vec<CalcReply> {
    let queue = BoundedQueue::new(capacity);

    thread::scope(|s| {
        let server_handles: Vec<_> = (0..servers)
            .map(|_| {
                let queue = queue.clone();
                s.spawn(move || serve(&queue))
            })
            .collect();

        let client_handles: Vec<_> = requests
            .iter()
            .enumerate()
            .map(|(i, &(op, a, b))| {
                let queue = queue.clone();
                s.spawn(move || {
                    let (tx, rx) = oneshot::channel();
                    queue.enqueue(CalcRequest {
                        op: op.to_owned(),
                        a,
                        b,
                        reply: tx,
                    });
                    let result = rx.blocking_recv().unwrap_or(Err(CalcError::NoReply));
                    CalcReply {
                        client_id: i + 1,
                        op: op.to_owned(),
                        a,
                        b,
                        result,
                    }
                })
            })
            .collect();

        let replies: Vec<CalcReply> = client_handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
            .collect();

        queue.close();
        let served: usize = server_handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|p| std::panic::resume_unwind(p)))
            .sum();
        tracing::debug!("{servers} calculator threads served {served} requests");

        replies
    })
}

pub fn run(_config: LabConfig) -> ScenarioFuture {
    Box::pin(async move {
        let replies =
            tokio::task::spawn_blocking(|| calculate(SERVERS, QUEUE_CAPACITY, REQUESTS)).await?;

        for r in &replies {
            let expr = format!("{:.2} {} {:.2}", r.a, r.op, r.b);
            match &r.result {
                Ok(v) => println!("Client {}: {expr} = {v:.2}", r.client_id),
                Err(e) => println!("Client {}: {expr} -> error: {e}", r.client_id),
            }
        }
        println!("Calculator shut down");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_operators() {
        assert_eq!(evaluate("+", 10.0, 5.0), Ok(15.0));
        assert_eq!(evaluate("-", 20.0, 8.0), Ok(12.0));
        assert_eq!(evaluate("*", 7.0, 6.0), Ok(42.0));
        assert_eq!(evaluate("/", 100.0, 4.0), Ok(25.0));
    }

    #[test]
    fn errors_are_replies() {
        assert_eq!(evaluate("/", 1.0, 0.0), Err(CalcError::DivisionByZero));
        assert_eq!(
            evaluate("^", 2.0, 3.0),
            Err(CalcError::UnknownOperator("^".into()))
        );
    }

    #[test]
    fn every_client_gets_its_own_reply() {
        let replies = calculate(SERVERS, 2, REQUESTS);

        assert_eq!(replies.len(), REQUESTS.len());
        for (reply, (op, a, b)) in replies.iter().zip(REQUESTS) {
            assert_eq!(reply.op, *op);
            assert_eq!(reply.result, evaluate(op, *a, *b));
        }
    }

    #[test]
    fn single_server_handles_everything() {
        let replies = calculate(1, 1, &[("+", 1.0, 1.0), ("/", 3.0, 0.0)]);
        assert_eq!(replies[0].result, Ok(2.0));
        assert_eq!(replies[1].result, Err(CalcError::DivisionByZero));
    }
}
