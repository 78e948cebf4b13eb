use std::time::Duration;

use bot_link::{SERVO_CENTER, SERVO_LEFT, SERVO_RIGHT};
use bot_proto::Command;

use crate::interlock;
use crate::timer::LoopTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolStep {
    Drive(Command),
    Pan { angle: u8, label: &'static str },
    Snap,
}

pub const PATROL_PHASES: u8 = 10;

/// Creep forward, take a left/right/center scan, turn left, repeat.
pub const PATROL_PROGRAM: [PatrolStep; PATROL_PHASES as usize] = [
    PatrolStep::Drive(Command::Forward),
    PatrolStep::Drive(Command::Stop),
    PatrolStep::Pan { angle: SERVO_LEFT, label: "scan left" },
    PatrolStep::Snap,
    PatrolStep::Pan { angle: SERVO_RIGHT, label: "scan right" },
    PatrolStep::Snap,
    PatrolStep::Pan { angle: SERVO_CENTER, label: "scan center" },
    PatrolStep::Snap,
    PatrolStep::Drive(Command::Left),
    PatrolStep::Drive(Command::Stop),
];

/// Phase counter plus the patrol's own timer.
#[derive(Debug)]
pub struct PatrolSequencer {
    timer: LoopTimer,
    phase: u8,
}

impl PatrolSequencer {
    pub fn new(period: Duration) -> Self {
        Self { timer: LoopTimer::new(period), phase: 0 }
    }

    pub fn phase(&self) -> u8 {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    /// No-op (false) while already running.
    pub fn start(&mut self) -> bool {
        if !self.timer.start() {
            return false;
        }
        self.phase = 0;
        true
    }

    pub fn stop(&mut self) -> bool {
        self.phase = 0;
        self.timer.stop()
    }

    pub async fn tick(&mut self) {
        self.timer.tick().await
    }

    /// Step to run on this tick. With an obstacle present the interlock
    /// holds the whole tick, scan phases included, and the phase is retried
    /// next time.
    pub fn advance(&mut self, obstacle: bool) -> Option<(u8, PatrolStep)> {
        if !interlock::allows(Command::Forward, obstacle) {
            return None;
        }
        let phase = self.phase;
        self.phase = (phase + 1) % PATROL_PHASES;
        Some((phase, PATROL_PROGRAM[phase as usize]))
    }
}
