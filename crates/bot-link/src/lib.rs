pub mod demo;
pub mod doctor;
pub mod http;
pub mod serial;
pub mod state;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::SharedLinkStatus;

/// Write-only actuator channel to the robot.
///
/// `send` is fire-and-forget: it must return without waiting on the
/// transport, and failures are logged by the implementation, never
/// reported back. Nothing here is a source of truth for robot state.
pub trait RobotLink: Send + Sync {
    fn send(&self, code: &str);
}

/// Camera pan servo, 0 = left, 90 = center, 180 = right. Same contract as
/// [`RobotLink::send`].
pub trait ServoControl: Send + Sync {
    fn set_angle(&self, angle: u8);
}

pub const SERVO_LEFT: u8 = 0;
pub const SERVO_CENTER: u8 = 90;
pub const SERVO_RIGHT: u8 = 180;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("http request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("serial write failed: {0}")]
    Serial(#[from] std::io::Error),
    #[error("link writer closed")]
    Closed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// "demo" (log only), "http" or "serial".
    pub mode: String,

    /// Robot control endpoint, commands go to `{control_url}/{code}`.
    pub control_url: Option<String>,

    /// Camera endpoint, pan goes to `{stream_url}/pan?angle=N`.
    /// Empty or missing disables servo control in http mode.
    pub stream_url: Option<String>,

    /// Serial mode: controller device and baud.
    pub serial_dev: Option<String>,
    pub baud: Option<u32>,

    /// Per-request timeout for http mode.
    pub timeout_ms: Option<u64>,
}

/// The two actuator ports, usually backed by one transport.
#[derive(Clone)]
pub struct LinkPorts {
    pub link: Arc<dyn RobotLink>,
    pub servo: Arc<dyn ServoControl>,
}

/// Opens the configured transport. Must run inside a tokio runtime (the http
/// and serial backends spawn their I/O onto it).
pub fn open(cfg: &LinkConfig, status: SharedLinkStatus) -> Result<LinkPorts> {
    {
        let mut st = status.lock().unwrap();
        st.mode = cfg.mode.clone();
    }
    match cfg.mode.as_str() {
        "demo" => {
            let l = Arc::new(demo::DemoLink::new(status));
            Ok(LinkPorts { link: l.clone(), servo: l })
        }
        "http" => {
            let url = cfg.control_url.as_deref().context("link.control_url missing (mode=http)")?;
            let l = Arc::new(http::HttpLink::new(
                url,
                cfg.stream_url.as_deref().unwrap_or_default(),
                std::time::Duration::from_millis(cfg.timeout_ms.unwrap_or(1500)),
                status,
            )?);
            Ok(LinkPorts { link: l.clone(), servo: l })
        }
        "serial" => {
            let dev = cfg.serial_dev.as_deref().context("link.serial_dev missing (mode=serial)")?;
            let baud = cfg.baud.unwrap_or(115200);
            let l = Arc::new(serial::SerialLink::open(dev, baud, status)?);
            Ok(LinkPorts { link: l.clone(), servo: l })
        }
        other => anyhow::bail!("unknown link.mode: {}", other),
    }
}
