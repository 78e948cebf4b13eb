use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub type SharedLinkStatus = Arc<Mutex<LinkStatus>>;

/// Delivery bookkeeping. Sends are unacknowledged, so "ok" only means the
/// transport accepted the write.
#[derive(Debug, Clone, Default)]
pub struct LinkStatus {
    pub mode: String,
    pub sent: u64,
    pub failed: u64,
    pub last_code: Option<String>,
    pub last_error: Option<String>,
    pub last_ok: Option<Instant>,
}

impl LinkStatus {
    pub fn shared() -> SharedLinkStatus {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn record_ok(&mut self, code: &str) {
        self.sent += 1;
        self.last_code = Some(code.to_string());
        self.last_ok = Some(Instant::now());
    }

    pub fn record_err(&mut self, code: &str, err: &dyn std::fmt::Display) {
        self.failed += 1;
        self.last_code = Some(code.to_string());
        self.last_error = Some(err.to_string());
    }

    pub fn ok_age(&self) -> Option<Duration> {
        self.last_ok.map(|t| t.elapsed())
    }
}
