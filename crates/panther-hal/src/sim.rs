//! In-process simulated power stage for CI and bench testing without the
//! GPIO driver.
//!
//! [`SimPowerStage`] implements [`PowerStage`] over shared state.  A
//! [`SimPowerStageHandle`] obtained from [`SimPowerStage::handle`] stays valid
//! after the stage itself has been moved into the controller, so tests and the
//! operator shell can flip the ready line and inspect motor-enable writes.
//!
//! # Example
//!
//! ```rust
//! use panther_hal::{PowerStage, sim::SimPowerStage};
//!
//! let mut stage = SimPowerStage::new(false);
//! let handle = stage.handle();
//!
//! handle.push_samples([true, false]);
//! assert!(stage.power_stage_ready().unwrap());
//! assert!(!stage.power_stage_ready().unwrap());
//! // The last scripted sample sticks.
//! assert!(!stage.power_stage_ready().unwrap());
//!
//! stage.set_motor_enable(true).unwrap();
//! assert_eq!(handle.motor_enable_writes(), vec![true]);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use panther_types::PowerError;
use tracing::debug;

use crate::power_stage::PowerStage;

/// Component name reported in simulated hardware faults.
const COMPONENT: &str = "sim_power_stage";

#[derive(Debug, Default)]
struct SimState {
    /// Level returned once the scripted samples are exhausted.
    ready: bool,
    /// Samples returned one per read before falling back to `ready`.
    scripted: VecDeque<bool>,
    motor_enable: bool,
    writes: Vec<bool>,
    reads: usize,
    /// When set, the next read fails with this message.
    fail_next_read: Option<String>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

// ────────────────────────────────────────────────────────────────────────────
// Simulated stage
// ────────────────────────────────────────────────────────────────────────────

/// A simulated power stage.  Reads never block; writes always succeed.
///
/// Dropping the stage de-energises the motor-enable output, mirroring the
/// driver's safe-teardown contract.
pub struct SimPowerStage {
    state: Arc<Mutex<SimState>>,
}

impl SimPowerStage {
    /// Create a simulated stage whose ready line is held at `ready`.
    pub fn new(ready: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                ready,
                ..SimState::default()
            })),
        }
    }

    /// Return a handle sharing this stage's state.
    pub fn handle(&self) -> SimPowerStageHandle {
        SimPowerStageHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl PowerStage for SimPowerStage {
    fn power_stage_ready(&mut self) -> Result<bool, PowerError> {
        let mut state = lock(&self.state);
        if let Some(details) = state.fail_next_read.take() {
            return Err(PowerError::HardwareFault {
                component: COMPONENT.to_string(),
                details,
            });
        }
        state.reads += 1;
        if let Some(sample) = state.scripted.pop_front() {
            // Keep the last scripted value once the queue runs dry.
            state.ready = sample;
        }
        Ok(state.ready)
    }

    fn set_motor_enable(&mut self, enabled: bool) -> Result<(), PowerError> {
        let mut state = lock(&self.state);
        state.motor_enable = enabled;
        state.writes.push(enabled);
        Ok(())
    }
}

impl Drop for SimPowerStage {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        if state.motor_enable {
            debug!("sim power stage dropped; de-energising motor enable");
        }
        state.motor_enable = false;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handle
// ────────────────────────────────────────────────────────────────────────────

/// Shared control and inspection handle for a [`SimPowerStage`].
#[derive(Clone)]
pub struct SimPowerStageHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimPowerStageHandle {
    /// Hold the ready line at `ready`, discarding any scripted samples.
    pub fn set_ready(&self, ready: bool) {
        let mut state = lock(&self.state);
        state.scripted.clear();
        state.ready = ready;
    }

    /// Queue samples to be returned by successive reads.
    pub fn push_samples(&self, samples: impl IntoIterator<Item = bool>) {
        lock(&self.state).scripted.extend(samples);
    }

    /// Make the next read fail with a hardware fault.
    pub fn fail_next_read(&self, details: impl Into<String>) {
        lock(&self.state).fail_next_read = Some(details.into());
    }

    /// Current level of the ready line as the next unscripted read would see it.
    pub fn ready(&self) -> bool {
        lock(&self.state).ready
    }

    /// Current level of the motor-enable output.
    pub fn motor_enable(&self) -> bool {
        lock(&self.state).motor_enable
    }

    /// Every motor-enable write, oldest first.
    pub fn motor_enable_writes(&self) -> Vec<bool> {
        lock(&self.state).writes.clone()
    }

    /// Number of successful reads of the ready line.
    pub fn reads(&self) -> usize {
        lock(&self.state).reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_held_level() {
        let mut stage = SimPowerStage::new(true);
        assert!(stage.power_stage_ready().unwrap());
        assert!(stage.power_stage_ready().unwrap());
        assert_eq!(stage.handle().reads(), 2);
    }

    #[test]
    fn scripted_samples_are_consumed_in_order() {
        let mut stage = SimPowerStage::new(false);
        let handle = stage.handle();
        handle.push_samples([true, true, false]);

        let seen: Vec<bool> = (0..5).map(|_| stage.power_stage_ready().unwrap()).collect();
        assert_eq!(seen, vec![true, true, false, false, false]);
    }

    #[test]
    fn set_ready_discards_script() {
        let mut stage = SimPowerStage::new(false);
        let handle = stage.handle();
        handle.push_samples([false, false]);
        handle.set_ready(true);
        assert!(stage.power_stage_ready().unwrap());
        assert!(handle.ready());
    }

    #[test]
    fn writes_are_recorded() {
        let mut stage = SimPowerStage::new(false);
        let handle = stage.handle();
        stage.set_motor_enable(true).unwrap();
        stage.set_motor_enable(true).unwrap();
        stage.set_motor_enable(false).unwrap();
        assert_eq!(handle.motor_enable_writes(), vec![true, true, false]);
        assert!(!handle.motor_enable());
    }

    #[test]
    fn injected_read_failure_is_one_shot() {
        let mut stage = SimPowerStage::new(true);
        let handle = stage.handle();
        handle.fail_next_read("line stuck");

        let err = stage.power_stage_ready().unwrap_err();
        assert!(matches!(err, PowerError::HardwareFault { .. }));
        assert!(err.to_string().contains("line stuck"));

        assert!(stage.power_stage_ready().unwrap());
        assert_eq!(handle.reads(), 1);
    }

    #[test]
    fn drop_de_energises_motor_enable() {
        let mut stage = SimPowerStage::new(true);
        let handle = stage.handle();
        stage.set_motor_enable(true).unwrap();
        assert!(handle.motor_enable());

        drop(stage);
        assert!(!handle.motor_enable());
    }
}
