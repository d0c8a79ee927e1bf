use chrono::{Local, NaiveTime};
use log::{info, trace};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::display::DisplaySink;
use crate::filter::set::FilterSetManager;
use crate::models::packet::BusPacket;

/// A received packet with its arrival stamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrival {
    /// Arrival order within the session, starting at 1
    pub seq: u64,

    /// Local arrival time, `HH:MM:SS.mmm`
    pub timestamp: String,

    pub packet: BusPacket,
}

/// Format a time of day at millisecond resolution
pub fn format_timestamp(time: NaiveTime) -> String {
    time.format("%H:%M:%S%.3f").to_string()
}

/// Receives decoded packets, keeps the session history and forwards
/// accepted packets to the display
pub struct PacketSink {
    filters: Arc<FilterSetManager>,
    display: Arc<dyn DisplaySink>,

    /// Every packet received this session, in arrival order
    history: Mutex<Vec<Arc<Arrival>>>,

    /// Forward packets to the display as they arrive
    live: AtomicBool,

    next_seq: AtomicU64,
}

impl PacketSink {
    pub fn new(filters: Arc<FilterSetManager>, display: Arc<dyn DisplaySink>) -> Self {
        Self {
            filters,
            display,
            history: Mutex::new(Vec::new()),
            live: AtomicBool::new(true),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Receive a packet stamped with the current local time
    pub fn on_packet(&self, packet: BusPacket) -> Arc<Arrival> {
        self.on_packet_at(Local::now().time(), packet)
    }

    /// Receive a packet with an explicit arrival time
    pub fn on_packet_at(&self, time: NaiveTime, packet: BusPacket) -> Arc<Arrival> {
        let mut history = self.history.lock();
        let arrival = Arc::new(Arrival {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            timestamp: format_timestamp(time),
            packet,
        });
        history.push(arrival.clone());
        trace!("Received packet #{} at {}", arrival.seq, arrival.timestamp);

        if self.is_live() && self.filters.matches(&arrival.packet) {
            self.display.append(arrival.clone());
        }
        arrival
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Turn forwarding of arriving packets on or off. Packets are kept in
    /// history either way.
    pub fn set_live(&self, live: bool) {
        let was = self.live.swap(live, Ordering::SeqCst);
        if was != live {
            info!("Live processing {}", if live { "started" } else { "stopped" });
        }
    }

    /// Discard all history and wipe the display
    pub fn clear(&self) {
        let mut history = self.history.lock();
        let dropped = history.len();
        history.clear();
        self.display.clear_display();
        info!("Cleared {} packets from history", dropped);
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// A page of history in arrival order
    pub fn history(&self, offset: usize, limit: usize) -> Vec<Arc<Arrival>> {
        self.history
            .lock()
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Run `f` over the full history while holding the history lock, so
    /// no packet is received in the meantime
    pub(crate) fn with_history<R>(&self, f: impl FnOnce(&[Arc<Arrival>]) -> R) -> R {
        let history = self.history.lock();
        f(&history)
    }
}
