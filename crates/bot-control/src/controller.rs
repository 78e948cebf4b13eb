use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use bot_link::{RobotLink, ServoControl};
use bot_proto::{CaptureOrigin, Command, ConsoleEvent, Mode, SensorSnapshot};
use bot_vision::analysis::AnalysisJob;
use bot_vision::diary::{Diary, DiaryNote};
use bot_vision::{CaptureError, CaptureTrigger};

use crate::actuator::Actuators;
use crate::analyze::AnalyzeSequence;
use crate::capability::{AlarmEmitter, HapticFeedback, HAPTIC_CAPTURED};
use crate::defense::{DefenseLoop, SirenHalf};
use crate::events::EventBus;
use crate::patrol::{PatrolSequencer, PatrolStep};
use crate::siren::WHOOP;
use crate::TimingConfig;

/// External collaborators the controller drives.
#[derive(Clone)]
pub struct Ports {
    pub link: Arc<dyn RobotLink>,
    pub servo: Arc<dyn ServoControl>,
    pub capture: Arc<dyn CaptureTrigger>,
    pub alarm: Arc<dyn AlarmEmitter>,
    pub haptics: Arc<dyn HapticFeedback>,
    pub diary: Arc<dyn Diary>,
}

#[derive(Debug)]
pub struct CaptureOutcome {
    pub origin: CaptureOrigin,
    pub result: Result<Bytes, CaptureError>,
}

/// What woke the event loop.
#[derive(Debug)]
pub enum Wakeup {
    PatrolTick,
    DefenseTick,
    AnalyzeSettled,
    Capture(CaptureOutcome),
}

/// Owned orchestration state: current mode, both loop timers, pending
/// Analyze captures. Only the mode transitions in this type mutate `mode`.
pub struct Controller {
    pub(crate) mode: Mode,
    pub(crate) patrol: PatrolSequencer,
    pub(crate) defense: DefenseLoop,
    pub(crate) analyze: AnalyzeSequence,
    pub(crate) out: Actuators,
    sensors: watch::Receiver<SensorSnapshot>,
    capture: Arc<dyn CaptureTrigger>,
    captures_tx: mpsc::UnboundedSender<CaptureOutcome>,
    captures_rx: mpsc::UnboundedReceiver<CaptureOutcome>,
    diary: Arc<dyn Diary>,
    analysis: Option<mpsc::Sender<AnalysisJob>>,
}

impl Controller {
    pub fn new(ports: Ports, timing: &TimingConfig, sensors: watch::Receiver<SensorSnapshot>, events: EventBus) -> Self {
        let (captures_tx, captures_rx) = mpsc::unbounded_channel();
        Self {
            mode: Mode::Manual,
            patrol: PatrolSequencer::new(timing.patrol_tick()),
            defense: DefenseLoop::new(timing.defense_tick()),
            analyze: AnalyzeSequence::new(timing.analyze_settle()),
            out: Actuators::new(ports.link, ports.servo, ports.alarm, ports.haptics, events),
            sensors,
            capture: ports.capture,
            captures_tx,
            captures_rx,
            diary: ports.diary,
            analysis: None,
        }
    }

    /// Hand completed captures to an analysis pipeline.
    pub fn with_analysis(mut self, jobs: mpsc::Sender<AnalysisJob>) -> Self {
        self.analysis = Some(jobs);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Only meaningful while patrolling.
    pub fn patrol_phase(&self) -> Option<u8> {
        (self.mode == Mode::AutoPatrol).then(|| self.patrol.phase())
    }

    pub fn patrol_running(&self) -> bool {
        self.patrol.is_running()
    }

    pub fn defense_running(&self) -> bool {
        self.defense.is_running()
    }

    pub fn strobe_on(&self) -> bool {
        self.out.strobe_on()
    }

    pub fn light_on(&self) -> bool {
        self.out.light_on()
    }

    pub fn pending_analyze(&self) -> usize {
        self.analyze.in_flight()
    }

    /// Live read, never cached.
    pub(crate) fn obstacle(&self) -> bool {
        self.sensors.borrow().obstacle_detected
    }

    pub async fn next_wakeup(&mut self) -> Wakeup {
        tokio::select! {
            biased;
            _ = self.patrol.tick() => Wakeup::PatrolTick,
            _ = self.defense.tick() => Wakeup::DefenseTick,
            _ = self.analyze.settled() => Wakeup::AnalyzeSettled,
            Some(outcome) = self.captures_rx.recv() => Wakeup::Capture(outcome),
        }
    }

    pub fn handle(&mut self, wakeup: Wakeup) {
        match wakeup {
            Wakeup::PatrolTick => self.on_patrol_tick(),
            Wakeup::DefenseTick => self.on_defense_tick(),
            Wakeup::AnalyzeSettled => {
                self.out.status("capturing");
                self.request_capture(CaptureOrigin::Analyze);
            }
            Wakeup::Capture(outcome) => self.on_capture(outcome),
        }
    }

    fn on_patrol_tick(&mut self) {
        let obstacle = self.obstacle();
        let Some((phase, step)) = self.patrol.advance(obstacle) else {
            debug!(phase = self.patrol.phase(), "patrol: obstacle, holding");
            return;
        };
        self.out.emit(ConsoleEvent::PatrolPhase { phase });
        match step {
            PatrolStep::Drive(cmd) => {
                self.forward(cmd);
            }
            PatrolStep::Pan { angle, label } => {
                self.out.status(label);
                self.out.emit(ConsoleEvent::Announce { text: label.to_string() });
                self.out.pan(angle);
            }
            PatrolStep::Snap => self.request_capture(CaptureOrigin::Patrol),
        }
    }

    fn on_defense_tick(&mut self) {
        match self.defense.toggle() {
            SirenHalf::On => {
                self.out.set_strobe(true);
                self.out.alarm(&WHOOP);
            }
            SirenHalf::Off => self.out.set_strobe(false),
        }
    }

    /// Fires the capture on its own task; the result comes back as a
    /// [`Wakeup::Capture`].
    fn request_capture(&mut self, origin: CaptureOrigin) {
        self.out.emit(ConsoleEvent::CaptureRequested { origin });
        let trigger = self.capture.clone();
        let done = self.captures_tx.clone();
        tokio::spawn(async move {
            let result = trigger.request_capture().await;
            let _ = done.send(CaptureOutcome { origin, result });
        });
    }

    fn on_capture(&mut self, outcome: CaptureOutcome) {
        let origin = outcome.origin;
        let image = match outcome.result {
            Ok(image) => image,
            Err(e) => {
                warn!(?origin, "capture failed: {}", e);
                self.out.emit(ConsoleEvent::CaptureFailed { origin, reason: e.to_string() });
                return;
            }
        };
        info!(?origin, bytes = image.len(), "capture complete");
        self.out.vibrate(&HAPTIC_CAPTURED);
        self.out.emit(ConsoleEvent::CaptureCompleted { origin, bytes: image.len() });

        if origin == CaptureOrigin::Patrol {
            self.diary.add_note(DiaryNote::patrol_snap(image.clone()));
        }

        if let Some(jobs) = &self.analysis {
            let job = AnalysisJob { image, sensors: self.sensors.borrow().clone(), origin };
            if let Err(e) = jobs.try_send(job) {
                warn!("analysis busy, dropping capture: {}", e);
            }
        }
    }

    pub fn status_line(&self) -> String {
        let mut s = format!("mode={:?}", self.mode);
        if let Some(p) = self.patrol_phase() {
            s.push_str(&format!(" phase={}", p));
        }
        s.push_str(&format!(
            " light={} strobe={} obstacle={} analyze_pending={}",
            self.light_on(),
            self.strobe_on(),
            self.obstacle(),
            self.pending_analyze()
        ));
        s
    }

    pub fn report_status(&self) {
        self.out.status(&self.status_line());
    }

    /// Leave any autonomous mode and halt the robot.
    pub fn shutdown(&mut self) {
        self.return_to_manual();
        self.out.send(Command::Stop);
    }
}
