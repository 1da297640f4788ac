//! [`EStopLatch`] – the emergency-stop state and its publication.
//!
//! Two states, [`EStopState::Active`] and [`EStopState::Cleared`]:
//!
//! - [`EStopLatch::trigger`] forces `Active` from any state and always
//!   publishes, even when already active, so observers that missed an event
//!   resynchronize.
//! - [`EStopLatch::clear`] moves `Active` → `Cleared` and publishes only on an
//!   actual change.  It is reached exclusively through an approved reset.
//!
//! Publication is best-effort: a failed send is logged and never rolls the
//! transition back.

use panther_middleware::{StateBus, Topic};
use panther_types::EventPayload;
use tracing::{debug, info};

/// Emergency-stop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EStopState {
    /// E-Stop asserted; motors must not be actuated.
    Active,
    /// Normal operation.
    Cleared,
}

impl EStopState {
    /// Wire representation: `true` = E-Stop asserted.
    pub fn is_active(self) -> bool {
        matches!(self, EStopState::Active)
    }
}

/// Latched E-Stop state publishing on [`Topic::EStop`].
#[derive(Debug)]
pub struct EStopLatch {
    state: EStopState,
    bus: StateBus,
}

impl EStopLatch {
    /// Build the latch from the power-stage-ready sample taken at startup and
    /// publish the initial value.
    ///
    /// A stage that is not ready starts the latch `Active`.
    pub fn new(power_stage_ready: bool, bus: StateBus) -> Self {
        let state = if power_stage_ready {
            EStopState::Cleared
        } else {
            EStopState::Active
        };
        let latch = Self { state, bus };
        info!(e_stop = state.is_active(), "E-Stop initialised");
        latch.publish();
        latch
    }

    pub fn state(&self) -> EStopState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Assert the E-Stop.  Always publishes.
    pub fn trigger(&mut self) {
        if !self.is_active() {
            info!("E-Stop triggered");
        }
        self.state = EStopState::Active;
        self.publish();
    }

    /// Clear an active E-Stop.  Returns `true` if the state changed (and was
    /// published), `false` if it was already cleared.
    pub(crate) fn clear(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = EStopState::Cleared;
        info!("E-Stop cleared");
        self.publish();
        true
    }

    fn publish(&self) {
        if let Err(e) = self
            .bus
            .publish(Topic::EStop, EventPayload::EStop(self.is_active()))
        {
            debug!(error = %e, "E-Stop publication not delivered");
        }
    }
}
