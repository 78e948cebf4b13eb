//! Mode and patrol orchestration for the field robot console.
//!
//! Everything here runs on one cooperative event loop ([`console::Console`]):
//! timer callbacks and operator commands each run to completion, so the
//! controller state needs no locking and a mode switch is atomic to every
//! later tick.

pub mod actuator;
pub mod analyze;
pub mod capability;
pub mod console;
pub mod controller;
pub mod defense;
mod dispatch;
pub mod doctor;
pub mod events;
pub mod interlock;
mod mode;
pub mod patrol;
pub mod sensors;
pub mod siren;
pub mod timer;
pub mod voice;

use serde::Deserialize;
use std::time::Duration;

pub use console::{Console, Input};
pub use controller::{Controller, Ports};
pub use events::EventBus;

/// Servo needs this long to reach center before a frame is worth taking.
pub const MIN_ANALYZE_SETTLE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub patrol_tick_ms: u64,
    pub defense_tick_ms: u64,
    pub analyze_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { patrol_tick_ms: 2500, defense_tick_ms: 400, analyze_settle_ms: 800 }
    }
}

impl TimingConfig {
    pub fn patrol_tick(&self) -> Duration {
        Duration::from_millis(self.patrol_tick_ms.max(1))
    }

    pub fn defense_tick(&self) -> Duration {
        Duration::from_millis(self.defense_tick_ms.max(1))
    }

    /// Never shorter than [`MIN_ANALYZE_SETTLE`].
    pub fn analyze_settle(&self) -> Duration {
        Duration::from_millis(self.analyze_settle_ms).max(MIN_ANALYZE_SETTLE)
    }
}
