//! [`IoStateAggregator`] – owner of the published digital-IO snapshot.
//!
//! The snapshot is published once at startup and afterwards only when
//! `motor_on` actually changes.  Its single writer is the
//! [`MotorStateSynchronizer`][crate::synchronizer::MotorStateSynchronizer].

use panther_middleware::{StateBus, Topic};
use panther_types::{EventPayload, IoState};
use tracing::{debug, info, warn};

/// Change-detecting publisher of the [`IoState`] snapshot.
#[derive(Debug)]
pub struct IoStateAggregator {
    state: IoState,
    bus: StateBus,
    initial_published: bool,
}

impl IoStateAggregator {
    /// Build the startup baseline around the live `motor_on` sample.  Nothing
    /// is published until [`publish_initial`][Self::publish_initial].
    pub fn new(motor_on: bool, bus: StateBus) -> Self {
        Self {
            state: IoState::baseline(motor_on),
            bus,
            initial_published: false,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> IoState {
        self.state
    }

    /// Publish the baseline snapshot.  Only the first call has an effect.
    pub fn publish_initial(&mut self) {
        if self.initial_published {
            warn!("IO state baseline already published; ignoring");
            return;
        }
        self.initial_published = true;
        self.publish();
    }

    /// Store `value` as `motor_on` and publish the snapshot if it changed.
    ///
    /// Returns `true` when a publication happened.
    pub fn set_motor_enabled(&mut self, value: bool) -> bool {
        if self.state.motor_on == value {
            return false;
        }
        self.state.motor_on = value;
        info!(motor_on = value, "motor power state changed");
        self.publish();
        true
    }

    fn publish(&self) {
        if let Err(e) = self
            .bus
            .publish(Topic::IoState, EventPayload::IoState(self.state))
        {
            debug!(error = %e, "IO state publication not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_published_once() {
        let bus = StateBus::default();
        let mut rx = bus.subscribe(Topic::IoState);
        let mut io = IoStateAggregator::new(true, bus);

        assert!(rx.drain().is_empty());
        io.publish_initial();
        io.publish_initial();

        let events = rx.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload, EventPayload::IoState(IoState::baseline(true)));
    }

    #[test]
    fn unchanged_value_is_noop() {
        let bus = StateBus::default();
        let mut rx = bus.subscribe(Topic::IoState);
        let mut io = IoStateAggregator::new(false, bus);

        assert!(!io.set_motor_enabled(false));
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn change_publishes_full_snapshot() {
        let bus = StateBus::default();
        let mut rx = bus.subscribe(Topic::IoState);
        let mut io = IoStateAggregator::new(false, bus);

        assert!(io.set_motor_enabled(true));
        let events = rx.drain();
        assert_eq!(events.len(), 1);
        match events[0].payload {
            EventPayload::IoState(state) => {
                assert!(state.motor_on);
                assert!(state.digital_power);
                assert!(!state.fan);
            }
            ref other => panic!("unexpected payload {other:?}"),
        }
        assert!(io.snapshot().motor_on);
    }

    #[test]
    fn only_motor_on_changes() {
        let bus = StateBus::default();
        let mut io = IoStateAggregator::new(true, bus);
        io.set_motor_enabled(false);
        io.set_motor_enabled(true);
        assert_eq!(io.snapshot(), IoState::baseline(true));
    }
}
