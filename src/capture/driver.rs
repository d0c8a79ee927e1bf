use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::packet::{BusPacket, Protocol};
use crate::utils::error::{AppError, AppResult};

/// A source of decoded bus packets.
///
/// `start` attaches the receiver; packets must be sent in arrival order.
/// `stop` detaches it.
pub trait BusDriver: Send {
    fn start(&mut self, receiver: mpsc::Sender<BusPacket>) -> AppResult<()>;
    fn stop(&mut self);
}

/// Where a feed driver reads from
#[derive(Debug, Clone)]
pub enum FeedSource {
    Stdin,
    File(PathBuf),
}

impl FeedSource {
    /// `-` selects stdin
    pub fn from_path(path: PathBuf) -> Self {
        if path.as_os_str() == "-" {
            FeedSource::Stdin
        } else {
            FeedSource::File(path)
        }
    }
}

/// Reads one JSON encoded packet per line, as produced by an external
/// bus decoder
pub struct FeedDriver {
    source: FeedSource,
    protocol: Protocol,
    task: Option<JoinHandle<()>>,
    errors: Arc<AtomicU64>,
}

impl FeedDriver {
    pub fn new(source: FeedSource, protocol: Protocol) -> Self {
        Self {
            source,
            protocol,
            task: None,
            errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of lines that could not be decoded
    pub fn error_counter(&self) -> Arc<AtomicU64> {
        self.errors.clone()
    }

    /// Forward packets read from `reader` until EOF or until the receiver
    /// goes away
    pub async fn run<R>(
        reader: R,
        protocol: Protocol,
        tx: mpsc::Sender<BusPacket>,
        errors: Arc<AtomicU64>,
    ) where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut line_no = 0u64;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read packet feed: {}", e);
                    break;
                }
            };
            line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            let packet = match serde_json::from_str::<BusPacket>(&line) {
                Ok(packet) => packet,
                Err(e) => {
                    warn!("Skipping feed line {}: {}", line_no, e);
                    errors.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            if packet.protocol != protocol {
                warn!(
                    "Skipping feed line {}: {} packet on a {} monitor",
                    line_no, packet.protocol, protocol
                );
                errors.fetch_add(1, Ordering::Relaxed);
                continue;
            }

            if tx.send(packet).await.is_err() {
                debug!("Packet receiver closed, stopping feed");
                break;
            }
        }

        info!("Packet feed finished after {} lines", line_no);
    }
}

impl BusDriver for FeedDriver {
    fn start(&mut self, receiver: mpsc::Sender<BusPacket>) -> AppResult<()> {
        if self.task.is_some() {
            return Err(AppError::DriverError("Feed is already attached".to_string()));
        }

        let protocol = self.protocol;
        let errors = self.errors.clone();
        let task = match &self.source {
            FeedSource::Stdin => {
                info!("Reading packet feed from stdin");
                let reader = BufReader::new(tokio::io::stdin());
                tokio::spawn(Self::run(reader, protocol, receiver, errors))
            }
            FeedSource::File(path) => {
                info!("Reading packet feed from {}", path.display());
                let file = std::fs::File::open(path)?;
                let reader = BufReader::new(tokio::fs::File::from_std(file));
                tokio::spawn(Self::run(reader, protocol, receiver, errors))
            }
        };

        self.task = Some(task);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Packet feed detached");
        }
    }
}

impl Drop for FeedDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feed_skips_bad_lines() {
        let feed = concat!(
            r#"{"protocol":"smart_bus","source_subnet_id":1,"source_device_id":5,"source_device_type":0,"operation_code":49,"target_subnet_id":0,"target_device_id":0}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"protocol":"hdl_buspro","source_subnet_id":1,"source_device_id":5,"source_device_type":0,"operation_code":49,"target_subnet_id":0,"target_device_id":0}"#,
            "\n",
            r#"{"protocol":"smart_bus","source_subnet_id":2,"source_device_id":5,"source_device_type":0,"operation_code":49,"target_subnet_id":0,"target_device_id":0,"content":[1,2,3]}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::channel(8);
        let errors = Arc::new(AtomicU64::new(0));

        FeedDriver::run(feed.as_bytes(), Protocol::SmartBus, tx, errors.clone()).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.source_subnet_id, 1);
        assert_eq!(second.source_subnet_id, 2);
        assert_eq!(second.content, vec![1, 2, 3]);
        assert!(rx.recv().await.is_none());
        assert_eq!(errors.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_file_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"{"protocol":"hdl_buspro","ip_address":"10.0.0.1","head":"HDLMIRACLE","source_subnet_id":1,"source_device_id":5,"source_device_type":0,"operation_code":49,"target_subnet_id":0,"target_device_id":0}"#,
        )
        .unwrap();

        let mut driver = FeedDriver::new(
            FeedSource::from_path(file.path().to_path_buf()),
            Protocol::HdlBuspro,
        );
        let (tx, mut rx) = mpsc::channel(8);
        driver.start(tx.clone()).unwrap();
        assert!(driver.start(tx).is_err());

        let packet = rx.recv().await.unwrap();
        assert_eq!(packet.head.as_deref(), Some("HDLMIRACLE"));
        driver.stop();
    }
}
