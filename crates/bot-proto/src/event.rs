use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::sensors::SensorSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Manual,
    AutoPatrol,
    Defense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureOrigin {
    /// Operator Analyze sequence.
    Analyze,
    /// Snap phase of the auto patrol.
    Patrol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub disease_name: String,
    pub confidence: f32,
    pub advice: String,
    pub fertilizer: String,
    pub is_healthy: bool,
}

/// Discrete signals for the operator surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsoleEvent {
    CommandSent { command: Command },
    /// Motion denied by the obstacle interlock.
    Blocked { command: Command },
    /// Manual input refused while an autonomous mode owns the robot.
    Rejected { command: Command, mode: Mode },
    ModeEntered { mode: Mode },
    ModeExited { mode: Mode },
    PatrolPhase { phase: u8 },
    StrobeChanged { on: bool },
    Alarm,
    Announce { text: String },
    CaptureRequested { origin: CaptureOrigin },
    CaptureCompleted { origin: CaptureOrigin, bytes: usize },
    CaptureFailed { origin: CaptureOrigin, reason: String },
    AnalysisCompleted { diagnosis: Diagnosis },
    AnalysisFailed { reason: String },
    Status { text: String },
    SensorUpdate { snapshot: SensorSnapshot },
}
