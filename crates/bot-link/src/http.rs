use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use crate::state::SharedLinkStatus;
use crate::{LinkError, RobotLink, ServoControl};

/// Robot controller reachable over plain HTTP (ESP32-style firmware):
/// `GET {control}/{code}` and `GET {stream}/pan?angle=N`.
pub struct HttpLink {
    client: Client,
    control_base: String,
    stream_base: String,
    status: SharedLinkStatus,
}

impl HttpLink {
    pub fn new(control_url: &str, stream_url: &str, timeout: Duration, status: SharedLinkStatus) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            control_base: normalize_url(control_url),
            stream_base: normalize_url(stream_url),
            status,
        })
    }

    fn fire(&self, url: String, label: String) {
        let client = self.client.clone();
        let status = self.status.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(rt) => {
                rt.spawn(async move {
                    match get(&client, &url).await {
                        Ok(()) => {
                            debug!("link: {} delivered", label);
                            status.lock().unwrap().record_ok(&label);
                        }
                        Err(e) => {
                            warn!("link: {} failed: {}", label, e);
                            status.lock().unwrap().record_err(&label, &e);
                        }
                    }
                });
            }
            Err(e) => {
                warn!("link: no runtime, dropping {}", label);
                status.lock().unwrap().record_err(&label, &e);
            }
        }
    }
}

impl RobotLink for HttpLink {
    fn send(&self, code: &str) {
        self.fire(format!("{}/{}", self.control_base, code), code.to_string());
    }
}

impl ServoControl for HttpLink {
    fn set_angle(&self, angle: u8) {
        if self.stream_base.is_empty() {
            debug!("link: no stream_url, servo pan {} skipped", angle);
            return;
        }
        let angle = angle.min(crate::SERVO_RIGHT);
        self.fire(format!("{}/pan?angle={}", self.stream_base, angle), format!("pan:{}", angle));
    }
}

async fn get(client: &Client, url: &str) -> Result<(), LinkError> {
    client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map(|_| ())
        .map_err(|source| LinkError::Http { url: url.to_string(), source })
}

/// Adds a missing `http://` scheme and strips trailing slashes.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }
    let url = url.trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}
