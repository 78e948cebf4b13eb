use anyhow::Result;

use crate::sensors::SensorConfig;
use crate::siren::WHOOP;
use crate::{TimingConfig, MIN_ANALYZE_SETTLE};

pub fn check_timing(t: &TimingConfig) -> Result<()> {
    anyhow::ensure!((500..=60_000).contains(&t.patrol_tick_ms), "timing.patrol_tick_ms should be 500..60000");
    anyhow::ensure!(
        t.defense_tick_ms as u128 >= WHOOP.duration.as_millis() && t.defense_tick_ms <= 5_000,
        "timing.defense_tick_ms should be {}..5000 (one siren sweep per tick)",
        WHOOP.duration.as_millis()
    );
    anyhow::ensure!(
        t.analyze_settle_ms as u128 >= MIN_ANALYZE_SETTLE.as_millis(),
        "timing.analyze_settle_ms below the {} ms servo settle minimum",
        MIN_ANALYZE_SETTLE.as_millis()
    );
    Ok(())
}

pub fn check_sensors(s: &SensorConfig) -> Result<()> {
    match s.source.as_str() {
        "simulated" => {}
        "file" => anyhow::ensure!(s.file.as_ref().map(|f| !f.is_empty()).unwrap_or(false), "sensors.file missing"),
        other => anyhow::bail!("unknown sensors.source: {}", other),
    }
    anyhow::ensure!(s.poll_ms >= 100, "sensors.poll_ms too small");
    anyhow::ensure!((0.0..=1.0).contains(&s.obstacle_probability), "sensors.obstacle_probability should be 0..1");
    anyhow::ensure!(s.history_len >= 1, "sensors.history_len must be >= 1");
    Ok(())
}
