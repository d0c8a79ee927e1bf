use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::packet::Protocol;

/// Monitor status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStats {
    /// Protocol being monitored
    pub protocol: Protocol,

    /// Whether arriving packets are forwarded to the display
    pub live: bool,

    /// Packets retained in history
    pub history_packets: usize,

    /// Packets currently displayed
    pub displayed_packets: usize,

    /// Rules being edited
    pub draft_rules: usize,

    /// Rules in the committed filter set
    pub committed_rules: usize,

    /// Generation of the committed filter set
    pub filter_generation: u64,

    /// Whether the apply affordance should be enabled
    pub filtering_active: bool,

    /// Feed lines that could not be decoded
    pub feed_errors: u64,

    /// When the session started
    pub start_time: DateTime<Utc>,
}
