use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::driver::BusDriver;
use crate::capture::replay::ReplayController;
use crate::capture::sink::{Arrival, PacketSink};
use crate::display::buffer::DisplayBuffer;
use crate::display::DisplaySink;
use crate::filter::rule::{RuleError, RuleId};
use crate::filter::set::FilterSetManager;
use crate::models::config::AppConfig;
use crate::models::packet::{BusPacket, Field};
use crate::models::stats::MonitorStats;
use crate::utils::error::{AppError, AppResult};

/// Ties the filter engine, packet sink, replay controller and display
/// together and owns the driver ingestion path
pub struct MonitorManager {
    /// Application configuration
    config: AppConfig,

    filters: Arc<FilterSetManager>,
    sink: Arc<PacketSink>,
    replay: ReplayController,
    display: Arc<DisplayBuffer>,

    /// Attached bus driver
    driver: Mutex<Option<Box<dyn BusDriver>>>,

    /// Task draining the driver channel into the sink
    ingest_task: Mutex<Option<JoinHandle<()>>>,

    /// Malformed packets reported by the driver
    feed_errors: Mutex<Option<Arc<AtomicU64>>>,

    start_time: DateTime<Utc>,
}

impl MonitorManager {
    /// Create a new monitor manager
    pub fn new(config: AppConfig) -> Self {
        let filters = Arc::new(FilterSetManager::new(config.protocol.schema()));
        let display = Arc::new(DisplayBuffer::new(config.protocol));
        let display_sink: Arc<dyn DisplaySink> = display.clone();
        let sink = Arc::new(PacketSink::new(filters.clone(), display_sink.clone()));
        sink.set_live(config.live);
        let replay = ReplayController::new(filters.clone(), sink.clone(), display_sink);

        Self {
            config,
            filters,
            sink,
            replay,
            display,
            driver: Mutex::new(None),
            ingest_task: Mutex::new(None),
            feed_errors: Mutex::new(None),
            start_time: Utc::now(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn filters(&self) -> &Arc<FilterSetManager> {
        &self.filters
    }

    pub fn display(&self) -> &Arc<DisplayBuffer> {
        &self.display
    }

    /// Attach a bus driver. Packets it sends are received in order by a
    /// single ingestion task. Must be called from within a tokio runtime.
    pub fn attach_driver(
        &self,
        mut driver: Box<dyn BusDriver>,
        feed_errors: Option<Arc<AtomicU64>>,
    ) -> AppResult<()> {
        let mut slot = self.driver.lock();
        if slot.is_some() {
            return Err(AppError::DriverError("A bus driver is already attached".to_string()));
        }

        let (tx, mut rx) = mpsc::channel::<BusPacket>(self.config.channel_capacity);
        driver.start(tx)?;

        let sink = self.sink.clone();
        let task = tokio::spawn(async move {
            while let Some(packet) = rx.recv().await {
                sink.on_packet(packet);
            }
            debug!("Packet ingestion task stopped");
        });

        *slot = Some(driver);
        *self.ingest_task.lock() = Some(task);
        *self.feed_errors.lock() = feed_errors;
        info!("Bus driver attached for {}", self.config.protocol);
        Ok(())
    }

    /// Detach the bus driver, if any
    pub fn detach_driver(&self) {
        if let Some(mut driver) = self.driver.lock().take() {
            driver.stop();
            info!("Bus driver detached");
        }
        if let Some(task) = self.ingest_task.lock().take() {
            task.abort();
        }
    }

    /// Receive one decoded packet directly
    pub fn receive(&self, packet: BusPacket) -> AppResult<Arc<Arrival>> {
        if packet.protocol != self.config.protocol {
            warn!(
                "Rejected {} packet on a {} monitor",
                packet.protocol, self.config.protocol
            );
            return Err(AppError::GenericError(format!(
                "Expected a {} packet, got {}",
                self.config.protocol, packet.protocol
            )));
        }
        Ok(self.sink.on_packet(packet))
    }

    /// Resume forwarding arriving packets to the display
    pub fn start_monitoring(&self) {
        self.sink.set_live(true);
    }

    /// Stop forwarding arriving packets; they are still recorded
    pub fn stop_monitoring(&self) {
        self.sink.set_live(false);
    }

    pub fn is_live(&self) -> bool {
        self.sink.is_live()
    }

    /// Add an empty filter rule
    pub fn add_rule(&self) -> RuleId {
        let id = self.filters.add_rule();
        self.display.notify_filtering_active(true);
        id
    }

    /// Set raw inputs of a filter rule
    pub fn edit_rule<'a>(
        &self,
        rule: RuleId,
        inputs: impl IntoIterator<Item = (Field, &'a str)>,
    ) -> AppResult<()> {
        let inputs: Vec<(Field, &str)> = inputs.into_iter().collect();
        self.filters.set_inputs(rule, &inputs)
    }

    /// Remove a filter rule
    pub fn remove_rule(&self, rule: RuleId) -> AppResult<()> {
        if !self.filters.remove_rule(rule)? {
            self.display.notify_filtering_active(false);
        }
        Ok(())
    }

    /// Commit the filter rules and rebuild the display from history
    pub fn apply_filters(&self) -> Result<usize, Vec<RuleError>> {
        self.replay.apply()
    }

    /// Rebuild the display from history with the committed filters
    pub fn reapply(&self) -> usize {
        self.replay.reapply()
    }

    /// Discard all received packets
    pub fn clear(&self) {
        self.sink.clear();
    }

    /// A page of history in arrival order
    pub fn history(&self, offset: usize, limit: usize) -> Vec<Arc<Arrival>> {
        self.sink.history(offset, limit)
    }

    pub fn history_len(&self) -> usize {
        self.sink.history_len()
    }

    /// Current monitor status
    pub fn stats(&self) -> MonitorStats {
        let committed = self.filters.committed();
        MonitorStats {
            protocol: self.config.protocol,
            live: self.sink.is_live(),
            history_packets: self.sink.history_len(),
            displayed_packets: self.display.len(),
            draft_rules: self.filters.drafts().len(),
            committed_rules: committed.rules.len(),
            filter_generation: committed.generation,
            filtering_active: self.display.filtering_active(),
            feed_errors: self
                .feed_errors
                .lock()
                .as_ref()
                .map(|c| c.load(Ordering::Relaxed))
                .unwrap_or(0),
            start_time: self.start_time,
        }
    }
}

impl Drop for MonitorManager {
    fn drop(&mut self) {
        self.detach_driver();
    }
}
