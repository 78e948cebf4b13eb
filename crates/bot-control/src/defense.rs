use std::time::Duration;

use crate::timer::LoopTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SirenHalf {
    On,
    Off,
}

/// Siren phase toggle plus the defense loop's own timer.
#[derive(Debug)]
pub struct DefenseLoop {
    timer: LoopTimer,
    siren_on: bool,
}

impl DefenseLoop {
    pub fn new(period: Duration) -> Self {
        Self { timer: LoopTimer::new(period), siren_on: false }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn siren_on(&self) -> bool {
        self.siren_on
    }

    pub fn start(&mut self) -> bool {
        if !self.timer.start() {
            return false;
        }
        self.siren_on = false;
        true
    }

    pub fn stop(&mut self) -> bool {
        self.siren_on = false;
        self.timer.stop()
    }

    pub async fn tick(&mut self) {
        self.timer.tick().await
    }

    pub fn toggle(&mut self) -> SirenHalf {
        self.siren_on = !self.siren_on;
        if self.siren_on {
            SirenHalf::On
        } else {
            SirenHalf::Off
        }
    }
}
