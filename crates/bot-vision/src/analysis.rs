use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use bot_proto::{CaptureOrigin, ConsoleEvent, Diagnosis, SensorSnapshot};

use crate::diary::{Diary, DiaryNote};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analyzer unavailable: {0}")]
    Unavailable(String),
    #[error("image rejected: {0}")]
    Rejected(String),
}

/// Opaque diagnosis service (remote vision model or a local stand-in).
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, image: &Bytes, sensors: &SensorSnapshot) -> Result<Diagnosis, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub image: Bytes,
    pub sensors: SensorSnapshot,
    pub origin: CaptureOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisState {
    Idle,
    PendingImage,
    Analyzing,
    Result(Diagnosis),
    Failed(String),
}

pub struct AnalysisPipeline {
    analyzer: Arc<dyn Analyzer>,
    diary: Arc<dyn Diary>,
    state: AnalysisState,
    pending: Option<AnalysisJob>,
}

impl AnalysisPipeline {
    pub fn new(analyzer: Arc<dyn Analyzer>, diary: Arc<dyn Diary>) -> Self {
        Self { analyzer, diary, state: AnalysisState::Idle, pending: None }
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// Replaces any image still waiting for analysis.
    pub fn submit(&mut self, job: AnalysisJob) {
        self.pending = Some(job);
        self.state = AnalysisState::PendingImage;
    }

    /// Analyzes the pending image, if any. A completed diagnosis is also
    /// written to the diary.
    pub async fn process(&mut self) -> &AnalysisState {
        let Some(job) = self.pending.take() else { return &self.state; };
        self.state = AnalysisState::Analyzing;
        self.state = match self.analyzer.analyze(&job.image, &job.sensors).await {
            Ok(d) => {
                info!(origin = ?job.origin, "analysis: {} ({:.0}%)", d.disease_name, d.confidence * 100.0);
                self.diary.add_note(DiaryNote::diagnosis(&d, job.image));
                AnalysisState::Result(d)
            }
            Err(e) => {
                warn!(origin = ?job.origin, "analysis failed: {}", e);
                AnalysisState::Failed(e.to_string())
            }
        };
        &self.state
    }

    /// Runs the pipeline as its own task, one job at a time. Outcomes are
    /// published on `events`; jobs arriving while the queue is full are the
    /// sender's problem (`try_send`).
    pub fn spawn(mut self, events: broadcast::Sender<ConsoleEvent>, depth: usize) -> (mpsc::Sender<AnalysisJob>, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<AnalysisJob>(depth.max(1));
        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                self.submit(job);
                let ev = match self.process().await {
                    AnalysisState::Result(d) => ConsoleEvent::AnalysisCompleted { diagnosis: d.clone() },
                    AnalysisState::Failed(reason) => ConsoleEvent::AnalysisFailed { reason: reason.clone() },
                    _ => continue,
                };
                let _ = events.send(ev);
            }
        });
        (tx, handle)
    }
}
