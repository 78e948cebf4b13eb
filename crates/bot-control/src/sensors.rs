use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::sync::watch;
use tracing::{info, warn};

use bot_proto::{ConsoleEvent, SensorSnapshot};

use crate::events::EventBus;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub source: String, // "simulated" | "file"
    pub file: Option<String>,
    pub poll_ms: u64,
    pub obstacle_probability: f64,
    pub history_len: usize,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            source: "simulated".into(),
            file: None,
            poll_ms: 3000,
            obstacle_probability: 0.02,
            history_len: 50,
        }
    }
}

/// Drifting telemetry for demo setups.
pub struct SimulatedFeed {
    last: SensorSnapshot,
    obstacle_probability: f64,
    rng: StdRng,
}

impl SimulatedFeed {
    pub fn new(obstacle_probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            last: SensorSnapshot::default(),
            obstacle_probability: obstacle_probability.clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn step(&mut self) -> SensorSnapshot {
        let r = &mut self.rng;
        let temp = 28.0 + r.gen::<f32>() * 2.0;
        let soil_step = if r.gen_bool(0.5) { 1.0 } else { -1.0 };
        let next = SensorSnapshot {
            temperature_c: (temp * 10.0).round() / 10.0,
            humidity_pct: r.gen_range(60..70) as f32,
            soil_moisture_pct: (self.last.soil_moisture_pct + soil_step).clamp(0.0, 100.0),
            obstacle_detected: r.gen_bool(self.obstacle_probability),
            battery_pct: Some((self.last.battery_pct.unwrap_or(100.0) - 0.05).max(0.0)),
        };
        self.last = next.clone();
        next
    }
}

pub enum SensorSource {
    Simulated(SimulatedFeed),
    /// JSON lines of [`SensorSnapshot`], replayed one per poll.
    File(Lines<BufReader<File>>),
}

impl SensorSource {
    pub async fn from_config(cfg: &SensorConfig) -> Result<Self> {
        match cfg.source.as_str() {
            "simulated" => Ok(Self::Simulated(SimulatedFeed::new(cfg.obstacle_probability, None))),
            "file" => {
                let path = cfg.file.as_ref().context("sensors.file missing")?;
                let f = File::open(path).await.with_context(|| format!("open sensor replay {}", path))?;
                Ok(Self::File(BufReader::new(f).lines()))
            }
            other => anyhow::bail!("unknown sensors.source: {}", other),
        }
    }

    /// `None` once a replay file is exhausted.
    pub async fn next_snapshot(&mut self) -> Result<Option<SensorSnapshot>> {
        match self {
            SensorSource::Simulated(feed) => Ok(Some(feed.step())),
            SensorSource::File(lines) => loop {
                let Some(line) = lines.next_line().await? else { return Ok(None); };
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let snap = serde_json::from_str(line).with_context(|| format!("parse sensor line {:?}", line))?;
                return Ok(Some(snap));
            },
        }
    }
}

/// Bounded history of recent snapshots, oldest first.
#[derive(Debug, Clone)]
pub struct SensorHistory {
    cap: usize,
    points: VecDeque<SensorSnapshot>,
}

pub type SharedHistory = Arc<Mutex<SensorHistory>>;

impl SensorHistory {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1), points: VecDeque::new() }
    }

    pub fn push(&mut self, s: SensorSnapshot) {
        if self.points.len() == self.cap {
            self.points.pop_front();
        }
        self.points.push_back(s);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&SensorSnapshot> {
        self.points.back()
    }

    pub fn soil_moisture_range(&self) -> Option<(f32, f32)> {
        let mut it = self.points.iter().map(|p| p.soil_moisture_pct);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Polls `source` and publishes each snapshot. Runs until every receiver of
/// `tx` is gone. Other holders of `tx` may patch the current snapshot
/// between polls; the next poll overwrites it.
pub async fn run_feed(
    mut source: SensorSource,
    poll: Duration,
    tx: Arc<watch::Sender<SensorSnapshot>>,
    history: SharedHistory,
    events: EventBus,
) {
    let mut ticker = tokio::time::interval(poll.max(Duration::from_millis(1)));
    loop {
        ticker.tick().await;
        if tx.is_closed() {
            break;
        }
        match source.next_snapshot().await {
            Ok(Some(snap)) => {
                if snap.obstacle_detected != tx.borrow().obstacle_detected {
                    info!(obstacle = snap.obstacle_detected, "sensors: obstacle state changed");
                }
                history.lock().unwrap().push(snap.clone());
                tx.send_replace(snap.clone());
                events.emit(ConsoleEvent::SensorUpdate { snapshot: snap });
            }
            Ok(None) => {}
            Err(e) => warn!("sensors: {:#}", e),
        }
    }
}
