use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::packet::Protocol;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bus protocol being monitored
    pub protocol: Protocol,

    /// Port for the REST API server
    pub port: u16,

    /// JSON-lines packet feed; `-` reads stdin
    pub feed: Option<PathBuf>,

    /// Forward packets to the display as they arrive
    pub live: bool,

    /// Capacity of the driver to sink channel
    pub channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::HdlBuspro,
            port: 3000,
            feed: None,
            live: true,
            channel_capacity: 1024,
        }
    }
}
