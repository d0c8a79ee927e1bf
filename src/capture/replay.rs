use log::{debug, info};
use std::sync::Arc;

use crate::capture::sink::PacketSink;
use crate::display::DisplaySink;
use crate::filter::rule::{FieldLocation, RuleError};
use crate::filter::set::FilterSetManager;

/// Re-runs the committed filter set over the packet history whenever the
/// filters change
pub struct ReplayController {
    filters: Arc<FilterSetManager>,
    sink: Arc<PacketSink>,
    display: Arc<dyn DisplaySink>,
}

impl ReplayController {
    pub fn new(
        filters: Arc<FilterSetManager>,
        sink: Arc<PacketSink>,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        Self {
            filters,
            sink,
            display,
        }
    }

    /// Commit the current drafts and, on success, rebuild the display.
    ///
    /// On failure the display and the committed set are left as they
    /// were and the invalid inputs are reported to the display.
    pub fn apply(&self) -> Result<usize, Vec<RuleError>> {
        match self.filters.commit() {
            Ok(_) => {
                self.display.notify_validation_errors(&[]);
                if !self.filters.has_drafts() {
                    self.display.notify_filtering_active(false);
                }
                Ok(self.reapply())
            }
            Err(errors) => {
                let locations: Vec<FieldLocation> = errors.iter().map(|e| e.location).collect();
                self.display.notify_validation_errors(&locations);
                Err(errors)
            }
        }
    }

    /// Clear the display and replay the whole history in arrival order
    /// against the committed set. Returns the number of packets shown.
    pub fn reapply(&self) -> usize {
        self.sink.with_history(|history| {
            // read under the history lock so replays follow commit order
            let set = self.filters.committed();
            self.display.clear_display();
            let mut shown = 0;
            for arrival in history.iter().filter(|a| set.matches(&a.packet)) {
                self.display.append(arrival.clone());
                shown += 1;
            }
            debug!(
                "Replayed {} packets against filter generation {}",
                history.len(),
                set.generation
            );
            info!("Filter reapplied: {} of {} packets shown", shown, history.len());
            shown
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::buffer::DisplayBuffer;
    use crate::filter::validator::ValidationError;
    use crate::models::packet::{BusPacket, Field, Protocol};

    struct Fixture {
        filters: Arc<FilterSetManager>,
        display: Arc<DisplayBuffer>,
        sink: Arc<PacketSink>,
        replay: ReplayController,
    }

    fn fixture() -> Fixture {
        let filters = Arc::new(FilterSetManager::new(Protocol::SmartBus.schema()));
        let display = Arc::new(DisplayBuffer::new(Protocol::SmartBus));
        let sink = Arc::new(PacketSink::new(filters.clone(), display.clone()));
        let replay = ReplayController::new(filters.clone(), sink.clone(), display.clone());
        Fixture {
            filters,
            display,
            sink,
            replay,
        }
    }

    fn packet(subnet: u8, device: u8) -> BusPacket {
        BusPacket {
            protocol: Protocol::SmartBus,
            ip_address: None,
            head: None,
            source_subnet_id: subnet,
            source_device_id: device,
            source_device_type: 0,
            operation_code: 0,
            target_subnet_id: 0,
            target_device_id: 0,
            content: Vec::new(),
        }
    }

    #[test]
    fn test_apply_filters_existing_history() {
        let f = fixture();
        f.sink.on_packet(packet(1, 5));
        f.sink.on_packet(packet(2, 5));
        assert_eq!(f.display.sequence(), vec![1, 2]);

        let by_subnet = f.filters.add_rule();
        f.filters.set_input(by_subnet, Field::SourceSubnetId, "1").unwrap();
        assert_eq!(f.replay.apply(), Ok(1));
        assert_eq!(f.display.sequence(), vec![1]);

        let by_device = f.filters.add_rule();
        f.filters.set_input(by_device, Field::SourceDeviceId, "5").unwrap();
        assert_eq!(f.replay.apply(), Ok(2));
        assert_eq!(f.display.sequence(), vec![1, 2]);
    }

    #[test]
    fn test_reapply_is_idempotent() {
        let f = fixture();
        for subnet in 0..6 {
            f.sink.on_packet(packet(subnet, subnet % 2));
        }
        let id = f.filters.add_rule();
        f.filters.set_input(id, Field::SourceDeviceId, "1").unwrap();
        f.replay.apply().unwrap();

        let first = f.display.rows(0, usize::MAX);
        f.replay.reapply();
        let second = f.display.rows(0, usize::MAX);
        assert_eq!(first, second);
        assert_eq!(f.display.sequence(), vec![2, 4, 6]);
    }

    #[test]
    fn test_reapply_shows_paused_packets() {
        let f = fixture();
        f.sink.set_live(false);
        f.sink.on_packet(packet(1, 1));
        assert!(f.display.is_empty());

        f.replay.reapply();
        assert_eq!(f.display.sequence(), vec![1]);
    }

    #[test]
    fn test_reapply_uses_latest_committed_set() {
        let f = Arc::new(fixture());
        f.sink.on_packet(packet(1, 0));
        f.sink.on_packet(packet(2, 0));

        let id = f.filters.add_rule();
        f.filters.set_input(id, Field::SourceSubnetId, "1").unwrap();
        f.filters.commit().unwrap();

        // a replay blocked on history while a newer set is committed
        let waiting = f.sink.with_history(|_| {
            let replaying = f.clone();
            let handle = std::thread::spawn(move || replaying.replay.reapply());
            std::thread::sleep(std::time::Duration::from_millis(50));
            f.filters.set_input(id, Field::SourceSubnetId, "2").unwrap();
            f.filters.commit().unwrap();
            handle
        });
        assert_eq!(waiting.join().unwrap(), 1);

        assert_eq!(f.display.sequence(), vec![2]);
        assert_eq!(f.filters.committed().generation, 2);
    }

    #[test]
    fn test_failed_apply_leaves_display() {
        let f = fixture();
        f.sink.on_packet(packet(1, 5));
        f.sink.on_packet(packet(2, 5));

        let id = f.filters.add_rule();
        f.filters.set_input(id, Field::SourceSubnetId, "x").unwrap();
        let errors = f.replay.apply().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error, ValidationError::NotANumber);

        assert_eq!(f.display.sequence(), vec![1, 2]);
        assert_eq!(f.display.validation_errors(), vec![errors[0].location]);

        f.filters.set_input(id, Field::SourceSubnetId, "2").unwrap();
        f.replay.apply().unwrap();
        assert!(f.display.validation_errors().is_empty());
        assert_eq!(f.display.sequence(), vec![2]);
    }
}
