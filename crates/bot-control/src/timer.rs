use std::future::pending;
use tokio::time::{self, Duration, Instant, Interval, MissedTickBehavior};

/// Owned periodic timer for one control loop.
///
/// `stop` drops the interval in place: once it returns, `tick` can no longer
/// resolve, so no late tick survives a stop.
#[derive(Debug)]
pub struct LoopTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl LoopTimer {
    pub fn new(period: Duration) -> Self {
        Self { period, interval: None }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// First tick lands one full period after start. Returns false (and
    /// leaves the running timer untouched) if already started.
    pub fn start(&mut self) -> bool {
        if self.interval.is_some() {
            return false;
        }
        let mut iv = time::interval_at(Instant::now() + self.period, self.period);
        iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(iv);
        true
    }

    pub fn stop(&mut self) -> bool {
        self.interval.take().is_some()
    }

    /// Resolves on the next tick; pends forever while stopped. Cancel-safe.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(iv) => {
                iv.tick().await;
            }
            None => pending::<()>().await,
        }
    }
}
