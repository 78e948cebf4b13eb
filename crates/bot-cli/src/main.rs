use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{info, warn};

use bot_control::capability::{LogAlarm, LogHaptics};
use bot_control::patrol::{PatrolStep, PATROL_PROGRAM};
use bot_control::sensors::{self, SensorConfig, SensorHistory, SensorSource, SharedHistory};
use bot_control::voice::{self, VoiceConfig};
use bot_control::{doctor as control_doctor, Console, Controller, EventBus, Input, Ports, TimingConfig};
use bot_link::state::{LinkStatus, SharedLinkStatus};
use bot_link::{doctor as link_doctor, LinkConfig};
use bot_proto::{ConsoleEvent, SensorSnapshot};
use bot_vision::analysis::AnalysisPipeline;
use bot_vision::demo::DemoAnalyzer;
use bot_vision::diary::LogDiary;
use bot_vision::CameraConfig;

#[derive(Debug, Parser)]
#[command(name = "fieldbot", version, about = "FieldBot - field robot operations console")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the config without touching hardware.
    Doctor,
    /// Start the console: commands on stdin, events as JSON lines on stdout.
    Run,
    Patrol { #[command(subcommand)] cmd: PatrolCmd },
    Link { #[command(subcommand)] cmd: LinkCmd },
}

#[derive(Debug, Subcommand)]
enum PatrolCmd {
    /// Print the patrol program with its tick schedule.
    Plan,
}

#[derive(Debug, Subcommand)]
enum LinkCmd {
    /// Send one link code (F B L R S LGT) and report the outcome.
    Send { code: String },
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    link: LinkConfig,
    timing: Option<TimingConfig>,
    sensors: Option<SensorConfig>,
    camera: Option<CameraConfig>,
    voice: Option<VoiceConfig>,
}

impl Config {
    fn timing(&self) -> TimingConfig {
        self.timing.clone().unwrap_or_default()
    }

    fn sensors(&self) -> SensorConfig {
        self.sensors.clone().unwrap_or_default()
    }

    fn camera(&self) -> CameraConfig {
        self.camera.clone().unwrap_or_default()
    }

    fn voice(&self) -> VoiceConfig {
        self.voice.clone().unwrap_or_default()
    }
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    Ok(toml::from_str(&s).context("parse config toml")?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the event stream
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    // link status is shared (even for subcommands)
    let link_status = LinkStatus::shared();

    match cli.cmd {
        Command::Doctor => doctor(&cfg).await?,
        Command::Run => run(&cfg, link_status).await?,
        Command::Patrol { cmd } => patrol_cmd(&cfg, cmd),
        Command::Link { cmd } => link_cmd(&cfg, cmd, link_status).await?,
    }
    Ok(())
}

async fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    link_doctor::check_link(&cfg.link)?;
    control_doctor::check_timing(&cfg.timing())?;
    control_doctor::check_sensors(&cfg.sensors())?;

    let camera = cfg.camera();
    bot_vision::open_camera(&camera)?;
    if camera.mode != "demo" && !std::path::Path::new(&camera.device).exists() {
        warn!("camera.device {} not present (ok if the camera is attached later)", camera.device);
    }
    if cfg.link.mode == "serial" {
        let dev = cfg.link.serial_dev.as_deref().unwrap_or_default();
        if !std::path::Path::new(dev).exists() {
            warn!("link.serial_dev {} not present", dev);
        }
    }

    if let Some(path) = cfg.voice().transcripts {
        if !std::path::Path::new(&path).exists() {
            warn!("voice.transcripts {} not present", path);
        }
    }

    info!("doctor: OK");
    Ok(())
}

fn patrol_cmd(cfg: &Config, cmd: PatrolCmd) {
    match cmd {
        PatrolCmd::Plan => {
            let tick = cfg.timing().patrol_tick();
            for (phase, step) in PATROL_PROGRAM.iter().enumerate() {
                let at = tick * (phase as u32 + 1);
                let what = match step {
                    PatrolStep::Drive(c) => format!("drive {} ({})", c, c.code()),
                    PatrolStep::Pan { angle, label } => format!("pan {} + announce {:?}", angle, label),
                    PatrolStep::Snap => "capture".to_string(),
                };
                println!("phase {} t+{:>5}ms  {}", phase, at.as_millis(), what);
            }
            println!("cycle {}ms, obstacle holds the current phase", (tick * PATROL_PROGRAM.len() as u32).as_millis());
        }
    }
}

async fn link_cmd(cfg: &Config, cmd: LinkCmd, link_status: SharedLinkStatus) -> Result<()> {
    match cmd {
        LinkCmd::Send { code } => {
            let command = bot_proto::Command::from_str(&code)?;
            let code = command.link_code().with_context(|| format!("{} has no link code", command))?;
            let ports = bot_link::open(&cfg.link, link_status.clone())?;
            ports.link.send(code);

            // sends are fire-and-forget; give the transport time to report
            let wait = Duration::from_millis(cfg.link.timeout_ms.unwrap_or(1500) + 250);
            let deadline = tokio::time::Instant::now() + wait;
            while tokio::time::Instant::now() < deadline {
                {
                    let st = link_status.lock().unwrap();
                    if st.sent + st.failed > 0 {
                        break;
                    }
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            print_link_status(&link_status);
            Ok(())
        }
    }
}

fn print_link_status(link_status: &SharedLinkStatus) {
    let st = link_status.lock().unwrap().clone();
    println!("mode={}", st.mode);
    println!("sent={} failed={}", st.sent, st.failed);
    println!("last_code={:?} last_error={:?}", st.last_code, st.last_error);
    println!("last_ok_age={:?}", st.ok_age());
}

#[derive(serde::Serialize)]
struct EventLine<'a> {
    ts_unix_ms: i64,
    #[serde(flatten)]
    event: &'a ConsoleEvent,
}

async fn print_events(mut rx: broadcast::Receiver<ConsoleEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let line = EventLine {
                    ts_unix_ms: (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64,
                    event: &event,
                };
                match serde_json::to_string(&line) {
                    Ok(s) => println!("{}", s),
                    Err(e) => warn!("event encode: {}", e),
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => warn!("event printer lagged, {} events dropped", n),
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Reads lines on a dedicated thread. A blocked read must never sit in the
/// runtime's blocking pool: runtime shutdown would wait on it forever.
fn spawn_line_reader<R, F>(name: &str, open: F) -> Result<mpsc::Receiver<String>>
where
    R: BufRead,
    F: FnOnce() -> std::io::Result<R> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(32);
    let label = name.to_string();
    std::thread::Builder::new()
        .name(format!("{}-reader", name))
        .spawn(move || {
            let reader = match open() {
                Ok(r) => r,
                Err(e) => {
                    warn!("{}: {}", label, e);
                    return;
                }
            };
            for line in reader.lines() {
                match line {
                    Ok(l) => {
                        if tx.blocking_send(l).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("{}: {}", label, e);
                        break;
                    }
                }
            }
        })
        .with_context(|| format!("spawn {} reader", name))?;
    Ok(rx)
}

/// Operator input, one command per line. Anything that is not a console
/// word is tried as a spoken phrase.
async fn read_operator(
    mut lines: mpsc::Receiver<String>,
    input: mpsc::Sender<Input>,
    sensors: Arc<watch::Sender<SensorSnapshot>>,
    history: SharedHistory,
    link_status: SharedLinkStatus,
) {
    while let Some(line) = lines.recv().await {
        let words: Vec<&str> = line.split_whitespace().collect();
        let msg = match words.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => Input::Shutdown,
            ["status"] => {
                {
                    let st = link_status.lock().unwrap();
                    info!(mode = %st.mode, sent = st.sent, failed = st.failed, last_error = ?st.last_error, "link status");
                }
                let h = history.lock().unwrap();
                info!(points = h.len(), soil_range = ?h.soil_moisture_range(), latest = ?h.latest(), "sensor history");
                Input::Status
            }
            ["obstacle", v] => {
                let on = match *v {
                    "on" | "1" | "true" => true,
                    "off" | "0" | "false" => false,
                    other => {
                        warn!("obstacle expects on|off, got {:?}", other);
                        continue;
                    }
                };
                sensors.send_modify(|s| s.obstacle_detected = on);
                info!(obstacle = on, "sensors: obstacle override (until next poll)");
                continue;
            }
            _ => {
                let typed = match words.as_slice() {
                    [word] => bot_proto::Command::from_str(word).ok().map(Input::Command),
                    _ => None,
                };
                match typed.or_else(|| voice::command_for_utterance(&line)) {
                    Some(msg) => msg,
                    None => {
                        warn!("unrecognized input: {:?}", line);
                        continue;
                    }
                }
            }
        };
        let quit = msg == Input::Shutdown;
        if input.send(msg).await.is_err() || quit {
            break;
        }
    }
    // stdin closed: keep running until quit from another source or ctrl-c
}

async fn run(cfg: &Config, link_status: SharedLinkStatus) -> Result<()> {
    info!("run: starting");

    let timing = cfg.timing();
    let sensor_cfg = cfg.sensors();

    let link = bot_link::open(&cfg.link, link_status.clone())?;
    let capture = bot_vision::open_camera(&cfg.camera())?;
    let diary = Arc::new(LogDiary);

    let bus = EventBus::new(256);
    let printer = tokio::spawn(print_events(bus.subscribe()));

    let (jobs, analysis_task) = AnalysisPipeline::new(Arc::new(DemoAnalyzer), diary.clone()).spawn(bus.sender(), 4);

    // Sensor feed
    let source = SensorSource::from_config(&sensor_cfg).await?;
    let (sensor_tx, sensor_rx) = watch::channel(SensorSnapshot::default());
    let sensor_tx = Arc::new(sensor_tx);
    let history: SharedHistory = Arc::new(Mutex::new(SensorHistory::new(sensor_cfg.history_len)));
    let feed = tokio::spawn(sensors::run_feed(
        source,
        Duration::from_millis(sensor_cfg.poll_ms),
        sensor_tx.clone(),
        history.clone(),
        bus.clone(),
    ));

    let ports = Ports {
        link: link.link,
        servo: link.servo,
        capture,
        alarm: Arc::new(LogAlarm),
        haptics: Arc::new(LogHaptics),
        diary,
    };
    let controller = Controller::new(ports, &timing, sensor_rx, bus.clone()).with_analysis(jobs);

    let (input_tx, input_rx) = mpsc::channel::<Input>(32);
    let console = tokio::spawn(Console::new(controller, input_rx).run());

    let ctrl_c_tx = input_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("run: ctrl-c");
            let _ = ctrl_c_tx.send(Input::Shutdown).await;
        }
    });

    if let Some(path) = cfg.voice().transcripts {
        info!("run: voice transcripts from {}", path);
        let heard = spawn_line_reader("voice", move || std::fs::File::open(&path).map(std::io::BufReader::new))?;
        tokio::spawn(voice::run_voice(heard, input_tx.clone()));
    }

    let stdin_lines = spawn_line_reader("stdin", || Ok(std::io::stdin().lock()))?;
    tokio::spawn(read_operator(stdin_lines, input_tx, sensor_tx, history, link_status.clone()));

    let controller = console.await.context("console task")?;
    info!("run: {}", controller.status_line());

    // let the final Stop reach the transport
    tokio::time::sleep(Duration::from_millis(200)).await;
    feed.abort();
    analysis_task.abort();
    printer.abort();

    let st = link_status.lock().unwrap().clone();
    info!(sent = st.sent, failed = st.failed, "run: done");
    Ok(())
}
