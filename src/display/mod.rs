pub mod buffer;
pub mod render;

use std::sync::Arc;

use crate::capture::sink::Arrival;
use crate::filter::rule::FieldLocation;

/// Where accepted packets and filter state notifications are sent
pub trait DisplaySink: Send + Sync {
    /// Push one accepted packet
    fn append(&self, arrival: Arc<Arrival>);

    /// Wipe all displayed packets
    fn clear_display(&self);

    /// Enable or disable the "apply filters" affordance
    fn notify_filtering_active(&self, active: bool);

    /// Report invalid filter inputs, in rule order. Empty clears any
    /// previous report.
    fn notify_validation_errors(&self, locations: &[FieldLocation]);
}
