use anyhow::Result;

use crate::LinkConfig;

pub fn check_link(cfg: &LinkConfig) -> Result<()> {
    match cfg.mode.as_str() {
        "demo" => {}
        "http" => {
            let url = cfg.control_url.as_deref().unwrap_or_default();
            anyhow::ensure!(!url.trim().is_empty(), "link.control_url missing");
            anyhow::ensure!(!url.starts_with("https://"), "link.control_url: https is not supported by the robot firmware");
            if let Some(t) = cfg.timeout_ms {
                anyhow::ensure!((100..=10_000).contains(&t), "link.timeout_ms should be 100..10000");
            }
        }
        "serial" => {
            anyhow::ensure!(cfg.serial_dev.as_ref().map(|s| !s.is_empty()).unwrap_or(false), "link.serial_dev missing");
            anyhow::ensure!(cfg.baud.unwrap_or(115200) > 0, "link.baud invalid");
        }
        other => anyhow::bail!("unknown link.mode: {}", other),
    }
    Ok(())
}
