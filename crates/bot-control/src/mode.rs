use tracing::{debug, info};

use bot_proto::{ConsoleEvent, Mode};

use crate::controller::Controller;

// Mode transitions. Each one finishes synchronously: the losing loop's timer
// is dropped before the winning loop's timer is created.
impl Controller {
    pub(crate) fn engage_auto_patrol(&mut self) {
        match self.mode {
            Mode::AutoPatrol => {
                debug!("mode: already patrolling");
                return;
            }
            Mode::Defense => self.exit_defense(),
            Mode::Manual => {}
        }
        self.patrol.start();
        self.enter(Mode::AutoPatrol, "auto patrol");
    }

    /// Defense is a toggle: engaging it while active turns it off.
    pub(crate) fn toggle_defense(&mut self) {
        match self.mode {
            Mode::Defense => {
                self.exit_defense();
                self.out.status("system ready");
                return;
            }
            Mode::AutoPatrol => self.exit_auto_patrol(),
            Mode::Manual => {}
        }
        self.defense.start();
        self.enter(Mode::Defense, "defense active");
    }

    /// Returns false if already manual.
    pub(crate) fn return_to_manual(&mut self) -> bool {
        match self.mode {
            Mode::AutoPatrol => self.exit_auto_patrol(),
            Mode::Defense => self.exit_defense(),
            Mode::Manual => return false,
        }
        true
    }

    fn exit_auto_patrol(&mut self) {
        self.patrol.stop();
        self.leave(Mode::AutoPatrol);
    }

    fn exit_defense(&mut self) {
        self.defense.stop();
        self.out.set_strobe(false);
        self.leave(Mode::Defense);
    }

    fn enter(&mut self, mode: Mode, status: &str) {
        info!("mode: {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.out.emit(ConsoleEvent::ModeEntered { mode });
        self.out.status(status);
    }

    fn leave(&mut self, mode: Mode) {
        info!("mode: {:?} -> Manual", mode);
        self.mode = Mode::Manual;
        self.out.emit(ConsoleEvent::ModeExited { mode });
    }
}
