use log::trace;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::capture::sink::Arrival;
use crate::display::render::{self, DisplayRow};
use crate::display::DisplaySink;
use crate::filter::rule::FieldLocation;
use crate::models::packet::Protocol;

const EVENT_CAPACITY: usize = 256;

/// Display update pushed to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEvent {
    Append { rows: Vec<DisplayRow> },
    Clear,
    FilteringActive { active: bool },
    ValidationErrors { locations: Vec<FieldLocation> },
}

/// In-memory display: the accepted packets in display order plus the
/// last filter state notifications
pub struct DisplayBuffer {
    protocol: Protocol,
    entries: RwLock<Vec<Arc<Arrival>>>,
    filtering_active: AtomicBool,
    validation_errors: RwLock<Vec<FieldLocation>>,
    events: broadcast::Sender<DisplayEvent>,
}

impl DisplayBuffer {
    pub fn new(protocol: Protocol) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            protocol,
            entries: RwLock::new(Vec::new()),
            filtering_active: AtomicBool::new(false),
            validation_errors: RwLock::new(Vec::new()),
            events,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Subscribe to display updates
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Displayed packets in display order
    pub fn entries(&self, offset: usize, limit: usize) -> Vec<Arc<Arrival>> {
        self.entries
            .read()
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Sequence numbers of all displayed packets
    pub fn sequence(&self) -> Vec<u64> {
        self.entries.read().iter().map(|a| a.seq).collect()
    }

    /// Rendered rows of the displayed packets in `[offset, offset + limit)`
    pub fn rows(&self, offset: usize, limit: usize) -> Vec<DisplayRow> {
        self.entries(offset, limit)
            .iter()
            .flat_map(|arrival| render::render(arrival))
            .collect()
    }

    /// Plain-text export of a range of displayed packets
    pub fn export_text(&self, offset: usize, limit: usize) -> String {
        render::export_text(&self.rows(offset, limit))
    }

    pub fn filtering_active(&self) -> bool {
        self.filtering_active.load(Ordering::SeqCst)
    }

    pub fn validation_errors(&self) -> Vec<FieldLocation> {
        self.validation_errors.read().clone()
    }

    fn publish(&self, event: impl FnOnce() -> DisplayEvent) {
        // no subscribers is fine
        if self.events.receiver_count() > 0 {
            let _ = self.events.send(event());
        }
    }
}

impl DisplaySink for DisplayBuffer {
    fn append(&self, arrival: Arc<Arrival>) {
        trace!("Displaying packet #{}", arrival.seq);
        self.publish(|| DisplayEvent::Append {
            rows: render::render(&arrival),
        });
        self.entries.write().push(arrival);
    }

    fn clear_display(&self) {
        self.entries.write().clear();
        self.publish(|| DisplayEvent::Clear);
    }

    fn notify_filtering_active(&self, active: bool) {
        self.filtering_active.store(active, Ordering::SeqCst);
        self.publish(|| DisplayEvent::FilteringActive { active });
    }

    fn notify_validation_errors(&self, locations: &[FieldLocation]) {
        *self.validation_errors.write() = locations.to_vec();
        self.publish(|| DisplayEvent::ValidationErrors {
            locations: locations.to_vec(),
        });
    }
}
