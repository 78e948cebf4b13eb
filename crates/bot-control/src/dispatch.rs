use tracing::{debug, info};

use bot_link::SERVO_CENTER;
use bot_proto::{Command, ConsoleEvent, Mode};

use crate::capability::HAPTIC_BLOCKED;
use crate::controller::Controller;
use crate::interlock;

impl Controller {
    /// Operator entry point for every command.
    ///
    /// While an autonomous mode owns the robot, manual drive and light
    /// commands are rejected; Stop, the mode toggles and Analyze always go
    /// through. Link failures never surface here.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::EngageAutoPatrol => self.engage_auto_patrol(),
            Command::EngageDefense => self.toggle_defense(),
            Command::Stop => {
                if self.return_to_manual() {
                    self.out.status("manual mode");
                }
                self.out.send(Command::Stop);
            }
            Command::Analyze => self.begin_analyze(),
            _ if self.mode != Mode::Manual => {
                debug!("dispatch: {} rejected in {:?}", command, self.mode);
                self.out.emit(ConsoleEvent::Rejected { command, mode: self.mode });
            }
            _ => {
                self.forward(command);
            }
        }
    }

    /// Interlock-gated write, shared by manual input and the patrol's drive
    /// steps. Only motion commands consult the interlock.
    pub(crate) fn forward(&mut self, command: Command) -> bool {
        if command.is_motion() && !interlock::allows(command, self.obstacle()) {
            info!("dispatch: {} blocked by obstacle", command);
            self.out.emit(ConsoleEvent::Blocked { command });
            self.out.vibrate(&HAPTIC_BLOCKED);
            self.out.status("obstacle ahead");
            return false;
        }
        self.out.send(command);
        true
    }

    fn begin_analyze(&mut self) {
        self.out.status("aligning camera");
        self.out.pan(SERVO_CENTER);
        let due = self.analyze.schedule();
        debug!(?due, "analyze: capture after {:?}", self.analyze.settle());
    }
}
