use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};

use bot_proto::{Diagnosis, SensorSnapshot};

use crate::analysis::{AnalysisError, Analyzer};
use crate::{CaptureError, CaptureTrigger};

/// Synthetic camera for demo mode: crop rows over soil, drifting a little
/// every frame so consecutive captures differ.
pub struct DemoCamera {
    width: u32,
    height: u32,
    frame: AtomicU32,
}

impl DemoCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width: width.max(16), height: height.max(16), frame: AtomicU32::new(0) }
    }
}

fn render_field(w: u32, h: u32, frame: u32) -> RgbImage {
    let row_pitch = (w / 8).max(4);
    let shift = frame.wrapping_mul(7) % row_pitch;
    RgbImage::from_fn(w, h, |x, y| {
        let in_row = (x + shift) % row_pitch < row_pitch / 2;
        let shade = (y * 60 / h) as u8;
        if in_row {
            Rgb([40 + shade / 2, 150 + shade, 40])
        } else {
            Rgb([110 + shade, 80 + shade / 2, 50])
        }
    })
}

#[async_trait]
impl CaptureTrigger for DemoCamera {
    async fn request_capture(&self) -> Result<Bytes, CaptureError> {
        let frame = self.frame.fetch_add(1, Ordering::Relaxed);
        let (w, h) = (self.width, self.height);
        tokio::task::spawn_blocking(move || -> Result<Bytes, CaptureError> {
            let img = DynamicImage::ImageRgb8(render_field(w, h, frame));
            let mut buf = Vec::new();
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)?;
            Ok(Bytes::from(buf))
        })
        .await
        .map_err(|_| CaptureError::Aborted)?
    }
}

/// Offline stand-in for the diagnosis service. Judges from sensor context
/// only; the image is just checked for presence.
pub struct DemoAnalyzer;

#[async_trait]
impl Analyzer for DemoAnalyzer {
    async fn analyze(&self, image: &Bytes, sensors: &SensorSnapshot) -> Result<Diagnosis, AnalysisError> {
        if image.is_empty() {
            return Err(AnalysisError::Rejected("empty image".into()));
        }
        let d = if sensors.soil_moisture_pct < 30.0 {
            Diagnosis {
                disease_name: "Water Stress".into(),
                confidence: 0.6,
                advice: "Soil is dry; irrigate in the evening.".into(),
                fertilizer: "None until moisture recovers".into(),
                is_healthy: false,
            }
        } else if sensors.humidity_pct > 85.0 {
            Diagnosis {
                disease_name: "Fungal Risk".into(),
                confidence: 0.5,
                advice: "High humidity; inspect leaves for spots and improve airflow.".into(),
                fertilizer: "Avoid nitrogen top-dressing".into(),
                is_healthy: false,
            }
        } else {
            Diagnosis {
                disease_name: "Healthy".into(),
                confidence: 0.7,
                advice: "No action needed.".into(),
                fertilizer: "Follow the regular schedule".into(),
                is_healthy: true,
            }
        };
        Ok(d)
    }
}
