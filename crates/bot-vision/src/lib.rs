pub mod analysis;
pub mod camera;
pub mod demo;
pub mod diary;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

pub use camera::CameraConfig;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("run {tool}: {source}")]
    Tool {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}")]
    ToolFailed { tool: &'static str, status: String },
    #[error("camera returned an empty frame")]
    EmptyFrame,
    #[error("encode frame: {0}")]
    Encode(#[from] image::ImageError),
    #[error("capture task aborted")]
    Aborted,
}

/// Supplier of one opaque image payload (JPEG) per call.
#[async_trait]
pub trait CaptureTrigger: Send + Sync {
    async fn request_capture(&self) -> Result<Bytes, CaptureError>;
}

pub fn open_camera(cfg: &CameraConfig) -> Result<Arc<dyn CaptureTrigger>> {
    match cfg.mode.as_str() {
        "demo" => Ok(Arc::new(demo::DemoCamera::new(cfg.width, cfg.height))),
        "libcamera-jpeg" | "v4l2-mjpeg" => Ok(Arc::new(camera::CameraCapture::new(cfg.clone()))),
        other => anyhow::bail!("unknown camera.mode: {}", other),
    }
}
