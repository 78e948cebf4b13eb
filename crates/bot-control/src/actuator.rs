use std::sync::Arc;
use tracing::debug;

use bot_link::{RobotLink, ServoControl};
use bot_proto::{Command, ConsoleEvent};

use crate::capability::{AlarmEmitter, HapticFeedback};
use crate::events::EventBus;
use crate::siren::SirenSweep;

/// Output side of the controller and the only writer to the robot link.
/// Holds the operator light and the defense strobe flags.
pub struct Actuators {
    link: Arc<dyn RobotLink>,
    servo: Arc<dyn ServoControl>,
    alarm: Arc<dyn AlarmEmitter>,
    haptics: Arc<dyn HapticFeedback>,
    events: EventBus,
    light_on: bool,
    strobe_on: bool,
}

impl Actuators {
    pub fn new(
        link: Arc<dyn RobotLink>,
        servo: Arc<dyn ServoControl>,
        alarm: Arc<dyn AlarmEmitter>,
        haptics: Arc<dyn HapticFeedback>,
        events: EventBus,
    ) -> Self {
        Self { link, servo, alarm, haptics, events, light_on: false, strobe_on: false }
    }

    /// Writes the command's link code, if it has one. Unchecked: callers gate
    /// motion through the interlock first.
    pub fn send(&mut self, command: Command) {
        let Some(code) = command.link_code() else { return; };
        debug!("link <- {}", code);
        self.link.send(code);
        if command == Command::ToggleLight {
            self.light_on = !self.light_on;
        }
        self.events.emit(ConsoleEvent::CommandSent { command });
    }

    pub fn pan(&self, angle: u8) {
        self.servo.set_angle(angle);
    }

    pub fn set_strobe(&mut self, on: bool) {
        if self.strobe_on != on {
            self.strobe_on = on;
            self.events.emit(ConsoleEvent::StrobeChanged { on });
        }
    }

    pub fn alarm(&self, sweep: &SirenSweep) {
        self.alarm.emit(sweep);
        self.events.emit(ConsoleEvent::Alarm);
    }

    pub fn vibrate(&self, pattern_ms: &[u32]) {
        self.haptics.vibrate(pattern_ms);
    }

    pub fn status(&self, text: &str) {
        self.events.emit(ConsoleEvent::Status { text: text.to_string() });
    }

    pub fn emit(&self, ev: ConsoleEvent) {
        self.events.emit(ev);
    }

    pub fn light_on(&self) -> bool {
        self.light_on
    }

    pub fn strobe_on(&self) -> bool {
        self.strobe_on
    }
}
