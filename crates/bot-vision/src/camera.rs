use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tracing::debug;

use crate::{CaptureError, CaptureTrigger};

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub mode: String,   // "demo" | "libcamera-jpeg" | "v4l2-mjpeg"
    pub device: String, // /dev/video0 (v4l2)
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { mode: "demo".into(), device: "/dev/video0".into(), width: 640, height: 480 }
    }
}

/// Single-frame capture through external tools:
/// - libcamera-jpeg: `libcamera-still -n -t 1 --width W --height H -o -`
/// - v4l2-mjpeg: `ffmpeg` grabbing one MJPEG frame from the device
pub struct CameraCapture {
    cfg: CameraConfig,
}

impl CameraCapture {
    pub fn new(cfg: CameraConfig) -> Self {
        Self { cfg }
    }

    fn command(&self) -> (&'static str, Command) {
        let cfg = &self.cfg;
        if cfg.mode == "v4l2-mjpeg" {
            let mut cmd = Command::new("ffmpeg");
            cmd.args([
                "-hide_banner", "-loglevel", "error",
                "-f", "video4linux2",
                "-input_format", "mjpeg",
                "-video_size", &format!("{}x{}", cfg.width, cfg.height),
                "-i", &cfg.device,
                "-vframes", "1",
                "-f", "image2pipe",
                "-vcodec", "mjpeg",
                "-",
            ]);
            ("ffmpeg", cmd)
        } else {
            let mut cmd = Command::new("libcamera-still");
            cmd.args([
                "-n",
                "-t", "1",
                "--width", &cfg.width.to_string(),
                "--height", &cfg.height.to_string(),
                "-o", "-",
            ]);
            ("libcamera-still", cmd)
        }
    }
}

#[async_trait]
impl CaptureTrigger for CameraCapture {
    async fn request_capture(&self) -> Result<Bytes, CaptureError> {
        let (tool, mut cmd) = self.command();
        debug!("capture: {}", tool);
        let out = cmd.output().await.map_err(|source| CaptureError::Tool { tool, source })?;
        if !out.status.success() {
            return Err(CaptureError::ToolFailed { tool, status: out.status.to_string() });
        }
        if out.stdout.is_empty() {
            return Err(CaptureError::EmptyFrame);
        }
        Ok(Bytes::from(out.stdout))
    }
}
