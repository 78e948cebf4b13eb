use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub soil_moisture_pct: f32,
    #[serde(default)]
    pub obstacle_detected: bool,
    // Battery monitoring
    #[serde(default)]
    pub battery_pct: Option<f32>,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            temperature_c: 28.0,
            humidity_pct: 65.0,
            soil_moisture_pct: 45.0,
            obstacle_detected: false,
            battery_pct: Some(100.0),
        }
    }
}
