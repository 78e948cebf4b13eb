use std::collections::VecDeque;
use std::future::pending;
use tokio::time::{sleep_until, Duration, Instant};

/// Pending Analyze captures, each due one settle delay after its camera
/// was centered. Independent of mode: a queued capture fires even if the
/// mode changes meanwhile.
#[derive(Debug)]
pub struct AnalyzeSequence {
    settle: Duration,
    due: VecDeque<Instant>,
}

impl AnalyzeSequence {
    pub fn new(settle: Duration) -> Self {
        Self { settle, due: VecDeque::new() }
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub fn schedule(&mut self) -> Instant {
        let at = Instant::now() + self.settle;
        self.due.push_back(at);
        at
    }

    pub fn in_flight(&self) -> usize {
        self.due.len()
    }

    /// Resolves when the oldest pending capture is due, removing it.
    /// Cancel-safe: the entry is only popped in the poll that completes.
    pub async fn settled(&mut self) {
        match self.due.front().copied() {
            Some(at) => {
                sleep_until(at).await;
                self.due.pop_front();
            }
            None => pending::<()>().await,
        }
    }
}
