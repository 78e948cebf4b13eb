use tracing::info;

use crate::state::SharedLinkStatus;
use crate::{RobotLink, ServoControl};

/// Simulated robot: every write is logged and counts as delivered.
pub struct DemoLink {
    status: SharedLinkStatus,
}

impl DemoLink {
    pub fn new(status: SharedLinkStatus) -> Self {
        Self { status }
    }
}

impl RobotLink for DemoLink {
    fn send(&self, code: &str) {
        info!(code, "[demo] robot command");
        self.status.lock().unwrap().record_ok(code);
    }
}

impl ServoControl for DemoLink {
    fn set_angle(&self, angle: u8) {
        info!(angle, "[demo] servo moved");
        self.status.lock().unwrap().record_ok(&format!("pan:{}", angle));
    }
}
