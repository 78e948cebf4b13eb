use tokio::sync::mpsc;
use tracing::info;

use bot_proto::Command;

use crate::controller::Controller;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Status,
    Shutdown,
}

/// The single event loop: operator input, both loop timers, Analyze settle
/// delays and capture completions are all serviced here, one at a time.
pub struct Console {
    controller: Controller,
    input: mpsc::Receiver<Input>,
}

impl Console {
    pub fn new(controller: Controller, input: mpsc::Receiver<Input>) -> Self {
        Self { controller, input }
    }

    /// Runs until `Input::Shutdown` or the input channel closes, then stops
    /// the robot and hands the controller back.
    pub async fn run(mut self) -> Controller {
        info!("console: running");
        loop {
            tokio::select! {
                msg = self.input.recv() => match msg {
                    Some(Input::Command(cmd)) => self.controller.dispatch(cmd),
                    Some(Input::Status) => self.controller.report_status(),
                    Some(Input::Shutdown) | None => break,
                },
                wakeup = self.controller.next_wakeup() => self.controller.handle(wakeup),
            }
        }
        info!("console: shutting down");
        self.controller.shutdown();
        self.controller
    }
}
