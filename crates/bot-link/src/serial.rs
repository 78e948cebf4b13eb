use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_serial::SerialPortBuilderExt;
use tracing::{info, warn};

use crate::state::SharedLinkStatus;
use crate::{LinkError, RobotLink, ServoControl};

// Writes queued beyond this are dropped; the link never backs up the caller.
const WRITE_QUEUE: usize = 16;

/// Line-oriented serial controller: one `CODE\n` per command, `P<angle>\n`
/// for the pan servo.
pub struct SerialLink {
    tx: mpsc::Sender<String>,
    status: SharedLinkStatus,
}

impl SerialLink {
    pub fn open(dev: &str, baud: u32, status: SharedLinkStatus) -> Result<Self> {
        let mut port = tokio_serial::new(dev, baud)
            .open_native_async()
            .with_context(|| format!("open robot serial device {}", dev))?;
        info!("link: serial {} @ {}", dev, baud);

        let (tx, mut rx) = mpsc::channel::<String>(WRITE_QUEUE);
        let writer_status = status.clone();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                let label = line.trim_end().to_string();
                let res = async {
                    port.write_all(line.as_bytes()).await?;
                    port.flush().await
                }
                .await
                .map_err(LinkError::Serial);
                match res {
                    Ok(()) => writer_status.lock().unwrap().record_ok(&label),
                    Err(e) => {
                        warn!("link: serial write {} failed: {}", label, e);
                        writer_status.lock().unwrap().record_err(&label, &e);
                    }
                }
            }
        });

        Ok(Self { tx, status })
    }

    fn enqueue(&self, line: String) {
        if let Err(e) = self.tx.try_send(line) {
            let (line, err) = match e {
                mpsc::error::TrySendError::Full(l) => (l, "write queue full".to_string()),
                mpsc::error::TrySendError::Closed(l) => (l, LinkError::Closed.to_string()),
            };
            let label = line.trim_end();
            warn!("link: dropping {}: {}", label, err);
            self.status.lock().unwrap().record_err(label, &err);
        }
    }
}

impl RobotLink for SerialLink {
    fn send(&self, code: &str) {
        self.enqueue(format!("{}\n", code));
    }
}

impl ServoControl for SerialLink {
    fn set_angle(&self, angle: u8) {
        self.enqueue(format!("P{}\n", angle.min(crate::SERVO_RIGHT)));
    }
}
