use async_trait::async_trait;
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{timeout_at, Duration, Instant};

use bot_control::capability::{AlarmEmitter, HapticFeedback};
use bot_control::siren::SirenSweep;
use bot_control::voice::run_voice;
use bot_control::{Console, Controller, EventBus, Input, Ports, TimingConfig};
use bot_link::{RobotLink, ServoControl};
use bot_proto::{CaptureOrigin, Command, ConsoleEvent, Mode, SensorSnapshot};
use bot_vision::analysis::AnalysisPipeline;
use bot_vision::demo::DemoAnalyzer;
use bot_vision::diary::{Diary, DiaryNote, NoteKind};
use bot_vision::{CaptureError, CaptureTrigger};

#[derive(Debug, Clone, PartialEq)]
enum Action {
    Link(String),
    Servo(u8),
    Capture,
    Alarm,
    Vibrate(Vec<u32>),
    Note(NoteKind, String),
}

/// Stands in for every port and logs what the controller did, and when.
struct Robot {
    log: Mutex<Vec<(Instant, Action)>>,
    sensors: watch::Receiver<SensorSnapshot>,
    fail_capture: AtomicBool,
}

impl Robot {
    fn record(&self, a: Action) {
        self.log.lock().unwrap().push((Instant::now(), a));
    }

    fn actions(&self) -> Vec<Action> {
        self.log.lock().unwrap().iter().map(|(_, a)| a.clone()).collect()
    }

    /// Link, servo and capture activity only.
    fn motion(&self) -> Vec<Action> {
        self.actions()
            .into_iter()
            .filter(|a| matches!(a, Action::Link(_) | Action::Servo(_) | Action::Capture))
            .collect()
    }

    fn times_of(&self, want: &Action) -> Vec<Instant> {
        self.log.lock().unwrap().iter().filter(|(_, a)| a == want).map(|(t, _)| *t).collect()
    }

    fn since(&self, t: Instant) -> Vec<Action> {
        self.log.lock().unwrap().iter().filter(|(at, _)| *at >= t).map(|(_, a)| a.clone()).collect()
    }
}

impl RobotLink for Robot {
    fn send(&self, code: &str) {
        if code == "F" {
            assert!(!self.sensors.borrow().obstacle_detected, "forward sent with obstacle present");
        }
        self.record(Action::Link(code.to_string()));
    }
}

impl ServoControl for Robot {
    fn set_angle(&self, angle: u8) {
        self.record(Action::Servo(angle));
    }
}

#[async_trait]
impl CaptureTrigger for Robot {
    async fn request_capture(&self) -> Result<Bytes, CaptureError> {
        self.record(Action::Capture);
        if self.fail_capture.load(Ordering::SeqCst) {
            return Err(CaptureError::EmptyFrame);
        }
        Ok(Bytes::from_static(b"\xff\xd8jpeg\xff\xd9"))
    }
}

impl AlarmEmitter for Robot {
    fn emit(&self, sweep: &SirenSweep) {
        assert_eq!((sweep.start_hz, sweep.end_hz), (800.0, 1200.0));
        self.record(Action::Alarm);
    }
}

impl HapticFeedback for Robot {
    fn vibrate(&self, pattern_ms: &[u32]) {
        self.record(Action::Vibrate(pattern_ms.to_vec()));
    }
}

impl Diary for Robot {
    fn add_note(&self, note: DiaryNote) {
        self.record(Action::Note(note.kind, note.title));
    }
}

struct Rig {
    c: Controller,
    robot: Arc<Robot>,
    sensors: watch::Sender<SensorSnapshot>,
    bus: EventBus,
    events: broadcast::Receiver<ConsoleEvent>,
}

impl Rig {
    fn new() -> Self {
        Self::with_timing(TimingConfig::default())
    }

    fn with_timing(timing: TimingConfig) -> Self {
        let (sensors, rx) = watch::channel(SensorSnapshot::default());
        let robot = Arc::new(Robot {
            log: Mutex::new(Vec::new()),
            sensors: rx.clone(),
            fail_capture: AtomicBool::new(false),
        });
        let ports = Ports {
            link: robot.clone(),
            servo: robot.clone(),
            capture: robot.clone(),
            alarm: robot.clone(),
            haptics: robot.clone(),
            diary: robot.clone(),
        };
        let bus = EventBus::new(4096);
        let events = bus.subscribe();
        let c = Controller::new(ports, &timing, rx, bus.clone());
        Self { c, robot, sensors, bus, events }
    }

    fn with_analysis(self) -> Self {
        let Rig { c, robot, sensors, bus, events } = self;
        let pipeline = AnalysisPipeline::new(Arc::new(DemoAnalyzer), robot.clone());
        let (jobs, _task) = pipeline.spawn(bus.sender(), 4);
        Rig { c: c.with_analysis(jobs), robot, sensors, bus, events }
    }

    fn obstacle(&self, on: bool) {
        self.sensors.send_modify(|s| s.obstacle_detected = on);
    }

    async fn run_for(&mut self, d: Duration) {
        let deadline = Instant::now() + d;
        while let Ok(w) = timeout_at(deadline, self.c.next_wakeup()).await {
            self.c.handle(w);
        }
    }

    fn drain(&mut self) -> Vec<ConsoleEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = self.events.try_recv() {
            out.push(ev);
        }
        out
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Whole milliseconds since `t0`.
fn offsets(t0: Instant, at: Vec<Instant>) -> Vec<u128> {
    at.into_iter().map(|t| (t - t0).as_millis()).collect()
}

fn link(code: &str) -> Action {
    Action::Link(code.to_string())
}

#[tokio::test(start_paused = true)]
async fn patrol_cycle_runs_the_program_in_order() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageAutoPatrol);
    assert_eq!(rig.c.mode(), Mode::AutoPatrol);
    assert_eq!(rig.c.patrol_phase(), Some(0));

    rig.run_for(ms(25_100)).await;

    assert_eq!(
        rig.robot.motion(),
        vec![
            link("F"),
            link("S"),
            Action::Servo(0),
            Action::Capture,
            Action::Servo(180),
            Action::Capture,
            Action::Servo(90),
            Action::Capture,
            link("L"),
            link("S"),
        ]
    );
    assert_eq!(rig.c.patrol_phase(), Some(0));

    let phases: Vec<u8> = rig
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            ConsoleEvent::PatrolPhase { phase } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, (0..10).collect::<Vec<u8>>());
}

#[tokio::test(start_paused = true)]
async fn patrol_ticks_every_two_and_a_half_seconds() {
    let mut rig = Rig::new();
    let t0 = Instant::now();
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(2_400)).await;
    assert!(rig.robot.motion().is_empty());
    rig.run_for(ms(200)).await;
    assert_eq!(offsets(t0, rig.robot.times_of(&link("F"))), vec![2_500]);
}

#[tokio::test(start_paused = true)]
async fn patrol_snaps_are_noted_in_the_diary() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(20_100)).await;

    let notes: Vec<Action> = rig
        .robot
        .actions()
        .into_iter()
        .filter(|a| matches!(a, Action::Note(..)))
        .collect();
    assert_eq!(notes, vec![Action::Note(NoteKind::Note, "Auto Patrol Snap".into()); 3]);
    let buzz = rig.robot.actions().into_iter().filter(|a| *a == Action::Vibrate(vec![100])).count();
    assert_eq!(buzz, 3);
}

#[tokio::test(start_paused = true)]
async fn obstacle_holds_the_patrol() {
    let mut rig = Rig::new();
    rig.obstacle(true);
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(30_000)).await;

    assert_eq!(rig.c.patrol_phase(), Some(0));
    assert!(rig.robot.motion().is_empty());
    assert!(!rig.drain().iter().any(|e| matches!(e, ConsoleEvent::PatrolPhase { .. })));
}

#[tokio::test(start_paused = true)]
async fn obstacle_mid_patrol_skips_whole_ticks_including_scans() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(5_100)).await;
    assert_eq!(rig.c.patrol_phase(), Some(2));

    rig.obstacle(true);
    rig.run_for(ms(10_000)).await;
    assert_eq!(rig.c.patrol_phase(), Some(2));
    assert_eq!(rig.robot.motion(), vec![link("F"), link("S")]);

    rig.obstacle(false);
    rig.run_for(ms(2_500)).await;
    assert_eq!(rig.c.patrol_phase(), Some(3));
    assert_eq!(rig.robot.motion().last(), Some(&Action::Servo(0)));
}

#[tokio::test(start_paused = true)]
async fn manual_forward_is_blocked_by_obstacle() {
    let mut rig = Rig::new();
    rig.obstacle(true);
    rig.c.dispatch(Command::Forward);
    rig.c.dispatch(Command::Backward);
    rig.c.dispatch(Command::ToggleLight);

    assert_eq!(rig.robot.motion(), vec![link("B"), link("LGT")]);
    let blocked_buzz = rig.robot.actions().into_iter().filter(|a| *a == Action::Vibrate(vec![200, 100, 200])).count();
    assert_eq!(blocked_buzz, 1);
    let evs = rig.drain();
    assert!(evs.contains(&ConsoleEvent::Blocked { command: Command::Forward }));
    assert!(evs.contains(&ConsoleEvent::CommandSent { command: Command::Backward }));
    assert_eq!(rig.c.mode(), Mode::Manual);

    rig.obstacle(false);
    rig.c.dispatch(Command::Forward);
    assert_eq!(rig.robot.motion().last(), Some(&link("F")));
}

#[tokio::test(start_paused = true)]
async fn manual_commands_rejected_in_autonomous_modes() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.drain();
    for cmd in [Command::Forward, Command::Left, Command::ToggleLight] {
        rig.c.dispatch(cmd);
    }
    assert!(rig.robot.motion().is_empty());
    assert!(!rig.c.light_on());
    let evs = rig.drain();
    assert!(evs.contains(&ConsoleEvent::Rejected { command: Command::Left, mode: Mode::AutoPatrol }));
    assert_eq!(evs.iter().filter(|e| matches!(e, ConsoleEvent::Rejected { .. })).count(), 3);

    rig.c.dispatch(Command::EngageDefense);
    rig.c.dispatch(Command::Right);
    assert!(rig.drain().contains(&ConsoleEvent::Rejected { command: Command::Right, mode: Mode::Defense }));
    assert!(!rig.robot.motion().contains(&link("R")));
}

#[tokio::test(start_paused = true)]
async fn light_toggles_in_manual() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::ToggleLight);
    assert!(rig.c.light_on());
    rig.c.dispatch(Command::ToggleLight);
    assert!(!rig.c.light_on());
    assert_eq!(rig.robot.motion(), vec![link("LGT"), link("LGT")]);
}

#[tokio::test(start_paused = true)]
async fn defense_strobes_and_alarms_on_alternate_ticks() {
    let mut rig = Rig::new();
    let t0 = Instant::now();
    rig.c.dispatch(Command::EngageDefense);
    assert_eq!(rig.c.mode(), Mode::Defense);
    rig.drain();

    rig.run_for(ms(2_050)).await;

    let strobes: Vec<bool> = rig
        .drain()
        .into_iter()
        .filter_map(|e| match e {
            ConsoleEvent::StrobeChanged { on } => Some(on),
            _ => None,
        })
        .collect();
    assert_eq!(strobes, vec![true, false, true, false, true]);
    assert_eq!(offsets(t0, rig.robot.times_of(&Action::Alarm)), vec![400, 1_200, 2_000]);
    assert!(rig.c.strobe_on());
    // the strobe is a console signal only
    assert!(rig.robot.motion().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stopping_defense_clears_strobe_and_silences_alarm() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageDefense);
    rig.run_for(ms(450)).await;
    assert!(rig.c.strobe_on());

    rig.c.dispatch(Command::EngageDefense);
    assert_eq!(rig.c.mode(), Mode::Manual);
    assert!(!rig.c.strobe_on());
    assert!(!rig.c.defense_running());
    let t_stop = Instant::now();

    rig.run_for(ms(5_000)).await;
    assert!(!rig.robot.since(t_stop).contains(&Action::Alarm));
    assert!(rig.drain().contains(&ConsoleEvent::Status { text: "system ready".into() }));
}

#[tokio::test(start_paused = true)]
async fn stop_exits_defense_and_halts() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageDefense);
    rig.run_for(ms(450)).await;
    rig.drain();

    rig.c.dispatch(Command::Stop);
    assert_eq!(rig.c.mode(), Mode::Manual);
    assert!(!rig.c.strobe_on());
    assert_eq!(rig.robot.motion(), vec![link("S")]);

    let evs = rig.drain();
    let exited = evs.iter().position(|e| *e == ConsoleEvent::ModeExited { mode: Mode::Defense });
    let sent = evs.iter().position(|e| *e == ConsoleEvent::CommandSent { command: Command::Stop });
    assert!(exited.unwrap() < sent.unwrap());

    let alarms = rig.robot.times_of(&Action::Alarm).len();
    rig.run_for(ms(3_000)).await;
    assert_eq!(rig.robot.times_of(&Action::Alarm).len(), alarms);
}

#[tokio::test(start_paused = true)]
async fn defense_preempts_patrol() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(2_600)).await;
    assert_eq!(rig.c.patrol_phase(), Some(1));
    rig.drain();

    rig.c.dispatch(Command::EngageDefense);
    let t_switch = Instant::now();
    assert_eq!(rig.c.mode(), Mode::Defense);
    assert!(!rig.c.patrol_running());
    assert!(rig.c.defense_running());
    assert_eq!(rig.c.patrol_phase(), None);

    let evs = rig.drain();
    assert_eq!(
        evs.iter().filter(|e| matches!(e, ConsoleEvent::ModeExited { .. } | ConsoleEvent::ModeEntered { .. })).collect::<Vec<_>>(),
        vec![
            &ConsoleEvent::ModeExited { mode: Mode::AutoPatrol },
            &ConsoleEvent::ModeEntered { mode: Mode::Defense },
        ]
    );

    rig.run_for(ms(10_000)).await;
    let after = rig.robot.since(t_switch);
    assert!(after.iter().all(|a| *a == Action::Alarm));
    assert!(!after.is_empty());
}

#[tokio::test(start_paused = true)]
async fn patrol_preempts_defense() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageDefense);
    rig.run_for(ms(450)).await;
    assert!(rig.c.strobe_on());

    rig.c.dispatch(Command::EngageAutoPatrol);
    assert_eq!(rig.c.mode(), Mode::AutoPatrol);
    assert!(!rig.c.strobe_on());
    assert!(!rig.c.defense_running());
    assert_eq!(rig.c.patrol_phase(), Some(0));

    let alarms = rig.robot.times_of(&Action::Alarm).len();
    rig.run_for(ms(2_550)).await;
    assert_eq!(rig.robot.times_of(&Action::Alarm).len(), alarms);
    assert_eq!(rig.robot.motion(), vec![link("F")]);
}

#[tokio::test(start_paused = true)]
async fn re_engaging_patrol_is_a_no_op() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(5_100)).await;
    assert_eq!(rig.c.patrol_phase(), Some(2));

    rig.c.dispatch(Command::EngageAutoPatrol);
    assert_eq!(rig.c.patrol_phase(), Some(2));
    // still on the first cadence: next tick at 7.5 s
    rig.run_for(ms(2_450)).await;
    assert_eq!(rig.c.patrol_phase(), Some(3));

    let entered = rig.drain().iter().filter(|e| matches!(e, ConsoleEvent::ModeEntered { .. })).count();
    assert_eq!(entered, 1);
}

#[tokio::test(start_paused = true)]
async fn leaving_patrol_resets_phase() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(7_600)).await;
    assert_eq!(rig.c.patrol_phase(), Some(3));

    rig.c.dispatch(Command::Stop);
    assert_eq!(rig.c.patrol_phase(), None);
    rig.c.dispatch(Command::EngageAutoPatrol);
    assert_eq!(rig.c.patrol_phase(), Some(0));
}

#[tokio::test(start_paused = true)]
async fn stop_in_manual_is_forwarded_only() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::Stop);
    assert_eq!(rig.robot.motion(), vec![link("S")]);
    assert!(!rig.drain().iter().any(|e| matches!(e, ConsoleEvent::ModeExited { .. })));
}

#[tokio::test(start_paused = true)]
async fn analyze_centers_camera_then_captures_after_settle() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::Analyze);
    assert_eq!(rig.c.pending_analyze(), 1);
    rig.run_for(ms(1_000)).await;

    assert_eq!(rig.robot.motion(), vec![Action::Servo(90), Action::Capture]);
    let pan = rig.robot.times_of(&Action::Servo(90))[0];
    let snap = rig.robot.times_of(&Action::Capture)[0];
    assert!(snap - pan >= ms(800));
    assert_eq!(rig.c.pending_analyze(), 0);

    let evs = rig.drain();
    assert!(evs.contains(&ConsoleEvent::CaptureRequested { origin: CaptureOrigin::Analyze }));
    assert!(evs.iter().any(|e| matches!(e, ConsoleEvent::CaptureCompleted { origin: CaptureOrigin::Analyze, .. })));
    assert_eq!(rig.c.mode(), Mode::Manual);
}

#[tokio::test(start_paused = true)]
async fn analyze_settle_never_below_minimum() {
    let mut rig = Rig::with_timing(TimingConfig { analyze_settle_ms: 50, ..Default::default() });
    rig.c.dispatch(Command::Analyze);
    rig.run_for(ms(700)).await;
    assert_eq!(rig.robot.motion(), vec![Action::Servo(90)]);
    rig.run_for(ms(200)).await;
    assert_eq!(rig.robot.motion(), vec![Action::Servo(90), Action::Capture]);
}

#[tokio::test(start_paused = true)]
async fn analyze_survives_mode_changes() {
    let mut rig = Rig::new();
    rig.c.dispatch(Command::EngageDefense);
    rig.c.dispatch(Command::Analyze);
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.c.dispatch(Command::Stop);
    assert_eq!(rig.c.mode(), Mode::Manual);

    rig.run_for(ms(1_000)).await;
    assert!(rig.robot.motion().contains(&Action::Capture));
    assert_eq!(rig.c.mode(), Mode::Manual);
    // analyze captures are not patrol snaps
    assert!(!rig.robot.actions().iter().any(|a| matches!(a, Action::Note(..))));
}

#[tokio::test(start_paused = true)]
async fn capture_failure_leaves_patrol_running() {
    let mut rig = Rig::new();
    rig.robot.fail_capture.store(true, Ordering::SeqCst);
    rig.c.dispatch(Command::EngageAutoPatrol);
    rig.run_for(ms(12_600)).await;

    assert_eq!(rig.c.mode(), Mode::AutoPatrol);
    assert_eq!(rig.c.patrol_phase(), Some(5));
    let evs = rig.drain();
    assert!(evs.iter().any(|e| matches!(
        e,
        ConsoleEvent::CaptureFailed { origin: CaptureOrigin::Patrol, .. }
    )));
    assert!(!rig.robot.actions().iter().any(|a| matches!(a, Action::Note(..) | Action::Vibrate(_))));
}

#[tokio::test(start_paused = true)]
async fn completed_captures_reach_the_analysis_pipeline() {
    let mut rig = Rig::new().with_analysis();
    rig.sensors.send_modify(|s| s.soil_moisture_pct = 12.0);
    rig.c.dispatch(Command::Analyze);
    rig.run_for(ms(1_000)).await;
    // let the pipeline task drain its queue
    tokio::time::sleep(ms(10)).await;

    let evs = rig.drain();
    let diagnosis = evs
        .iter()
        .find_map(|e| match e {
            ConsoleEvent::AnalysisCompleted { diagnosis } => Some(diagnosis.clone()),
            _ => None,
        })
        .expect("analysis completed");
    assert_eq!(diagnosis.disease_name, "Water Stress");
    assert!(rig.robot.actions().contains(&Action::Note(NoteKind::Disease, "Water Stress".into())));
}

#[tokio::test(start_paused = true)]
async fn console_loop_serves_input_and_timers() {
    let rig = Rig::new();
    let robot = rig.robot.clone();
    let mut events = rig.bus.subscribe();
    let (tx, rx) = mpsc::channel(8);
    let console = tokio::spawn(Console::new(rig.c, rx).run());

    tx.send(Input::Command(Command::EngageAutoPatrol)).await.unwrap();
    tokio::time::sleep(ms(2_600)).await;
    tx.send(Input::Status).await.unwrap();
    tx.send(Input::Shutdown).await.unwrap();
    let c = console.await.unwrap();

    assert_eq!(c.mode(), Mode::Manual);
    assert!(!c.patrol_running());
    assert_eq!(robot.motion(), vec![link("F"), link("S")]);

    let mut saw_status = false;
    while let Ok(ev) = events.try_recv() {
        if let ConsoleEvent::Status { text } = ev {
            saw_status |= text.starts_with("mode=AutoPatrol phase=1");
        }
    }
    assert!(saw_status);
}

#[tokio::test(start_paused = true)]
async fn console_stops_robot_when_input_closes() {
    let rig = Rig::new();
    let robot = rig.robot.clone();
    let (tx, rx) = mpsc::channel(8);
    let console = tokio::spawn(Console::new(rig.c, rx).run());
    tx.send(Input::Command(Command::EngageDefense)).await.unwrap();
    tokio::time::sleep(ms(500)).await;
    drop(tx);

    let c = console.await.unwrap();
    assert_eq!(c.mode(), Mode::Manual);
    assert!(!c.strobe_on());
    assert_eq!(robot.motion(), vec![link("S")]);
}

#[tokio::test(start_paused = true)]
async fn random_operation_never_violates_safety_or_exclusivity() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut rig = Rig::new();
        for _ in 0..150 {
            if rng.gen_bool(0.3) {
                rig.obstacle(rng.gen_bool(0.5));
            }
            let cmd = Command::ALL[rng.gen_range(0..Command::ALL.len())];
            rig.c.dispatch(cmd);
            rig.run_for(ms(rng.gen_range(0..3_000))).await;

            let c = &rig.c;
            assert!(!(c.patrol_running() && c.defense_running()), "seed {}", seed);
            assert_eq!(c.patrol_running(), c.mode() == Mode::AutoPatrol, "seed {}", seed);
            assert_eq!(c.defense_running(), c.mode() == Mode::Defense, "seed {}", seed);
            if c.mode() != Mode::Defense {
                assert!(!c.strobe_on(), "seed {}", seed);
            }
            if c.mode() != Mode::AutoPatrol {
                assert_eq!(c.patrol_phase(), None);
            }
        }
    }
}

#[tokio::test(start_paused = true)]
async fn voice_commands_take_the_dispatch_path() {
    let rig = Rig::new();
    rig.obstacle(true);
    let robot = rig.robot.clone();
    let mut events = rig.bus.subscribe();
    let (input_tx, input_rx) = mpsc::channel(8);
    let console = tokio::spawn(Console::new(rig.c, input_rx).run());

    let (say, heard) = mpsc::channel::<String>(8);
    for text in ["go forward", "turn on the torch", "what is the weather"] {
        say.send(text.to_string()).await.unwrap();
    }
    drop(say);
    run_voice(heard, input_tx.clone()).await;

    input_tx.send(Input::Command(Command::EngageAutoPatrol)).await.unwrap();
    let (say, heard) = mpsc::channel::<String>(8);
    say.send("baaye".to_string()).await.unwrap();
    drop(say);
    run_voice(heard, input_tx.clone()).await;

    input_tx.send(Input::Shutdown).await.unwrap();
    console.await.unwrap();

    assert_eq!(robot.motion(), vec![link("LGT"), link("S")]);
    let mut evs = Vec::new();
    while let Ok(ev) = events.try_recv() {
        evs.push(ev);
    }
    assert!(evs.contains(&ConsoleEvent::Blocked { command: Command::Forward }));
    assert!(evs.contains(&ConsoleEvent::Rejected { command: Command::Left, mode: Mode::AutoPatrol }));
}
