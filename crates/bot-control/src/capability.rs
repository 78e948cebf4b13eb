use tracing::debug;

use crate::siren::SirenSweep;

/// Audible alarm output.
pub trait AlarmEmitter: Send + Sync {
    fn emit(&self, sweep: &SirenSweep);
}

/// Operator haptics; pattern alternates vibrate/pause durations in ms.
pub trait HapticFeedback: Send + Sync {
    fn vibrate(&self, pattern_ms: &[u32]);
}

pub const HAPTIC_BLOCKED: [u32; 3] = [200, 100, 200];
pub const HAPTIC_CAPTURED: [u32; 1] = [100];

/// Headless alarm: logs each sweep.
pub struct LogAlarm;

impl AlarmEmitter for LogAlarm {
    fn emit(&self, sweep: &SirenSweep) {
        debug!(
            "alarm: sweep {}->{} Hz over {:?}",
            sweep.start_hz, sweep.end_hz, sweep.duration
        );
    }
}

pub struct LogHaptics;

impl HapticFeedback for LogHaptics {
    fn vibrate(&self, pattern_ms: &[u32]) {
        debug!("haptic: {:?}", pattern_ms);
    }
}
