//! [`FaultTracker`] – CAN communication-error latch for the two motor
//! controllers.
//!
//! Each status report overwrites both flags; there is no history and no
//! acknowledge path.  A fault is cleared only by a later report in which the
//! controller says it is healthy again.

use panther_types::MotorControllersState;

/// Last reported CAN-net error flags of the front and rear motor controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultTracker {
    front: bool,
    rear: bool,
}

impl FaultTracker {
    /// Create a tracker with both flags set.
    ///
    /// Controller health is unknown until the first report arrives, so a
    /// reset stays blocked until then.
    pub fn new() -> Self {
        Self {
            front: true,
            rear: true,
        }
    }

    /// Overwrite both flags (last report wins).
    pub fn record_status(&mut self, front_error: bool, rear_error: bool) {
        self.front = front_error;
        self.rear = rear_error;
    }

    /// Overwrite both flags from a full status report.
    pub fn record_driver_state(&mut self, state: &MotorControllersState) {
        self.record_status(state.front.can_net_err, state.rear.can_net_err);
    }

    /// `true` if either controller reported a communication error.
    pub fn has_fault(&self) -> bool {
        self.front || self.rear
    }
}

impl Default for FaultTracker {
    fn default() -> Self {
        Self::new()
    }
}
