//! [`MotorStateSynchronizer`] – fixed-rate mirror of the power-stage-ready
//! line onto the motor-enable output.
//!
//! Each tick:
//!
//! 1. sample the power-stage-ready line,
//! 2. write the sample to the motor-enable output,
//! 3. hand the sample to the [`IoStateAggregator`], which republishes the IO
//!    snapshot only if `motor_on` changed.
//!
//! [`run`][MotorStateSynchronizer::run] drives the ticks from a
//! [`tokio::time::interval`].  A tick runs to completion before the next one
//! is awaited, so ticks never overlap; late ticks are delayed rather than
//! bursted.  A hardware-access failure ends the loop with the error.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use panther_hal::PowerStage;
use panther_types::PowerError;
use tokio::time::MissedTickBehavior;
use tracing::error;

use crate::io_state::IoStateAggregator;
use crate::lock;

/// Sole writer of the motor-enable output and of `IoState::motor_on`.
pub struct MotorStateSynchronizer {
    stage: Box<dyn PowerStage>,
    io_state: Arc<Mutex<IoStateAggregator>>,
    period: Duration,
}

impl MotorStateSynchronizer {
    pub(crate) fn new(
        stage: Box<dyn PowerStage>,
        io_state: Arc<Mutex<IoStateAggregator>>,
        period: Duration,
    ) -> Self {
        Self {
            stage,
            io_state,
            period,
        }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run one synchronization step.
    ///
    /// Returns `true` when the IO snapshot was republished.
    ///
    /// # Errors
    ///
    /// Propagates any [`PowerError::HardwareFault`] from the power stage.
    pub fn tick(&mut self) -> Result<bool, PowerError> {
        let ready = self.stage.power_stage_ready()?;
        self.stage.set_motor_enable(ready)?;
        Ok(lock(&self.io_state).set_motor_enabled(ready))
    }

    /// Tick forever at the configured period.
    ///
    /// Only returns on a hardware-access failure, which the caller must treat
    /// as fatal.  Dropping the future drops the power stage with it.
    pub async fn run(mut self) -> Result<(), PowerError> {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = self.tick() {
                error!(error = %e, "power stage access failed; stopping motor-state synchronizer");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panther_hal::SimPowerStage;
    use panther_middleware::{StateBus, Topic};

    fn synchronizer(
        motor_on: bool,
        bus: &StateBus,
    ) -> (MotorStateSynchronizer, panther_hal::SimPowerStageHandle) {
        let stage = SimPowerStage::new(motor_on);
        let handle = stage.handle();
        let io = Arc::new(Mutex::new(IoStateAggregator::new(motor_on, bus.clone())));
        (
            MotorStateSynchronizer::new(Box::new(stage), io, Duration::from_millis(10)),
            handle,
        )
    }

    #[test]
    fn tick_mirrors_signal_to_output() {
        let bus = StateBus::default();
        let (mut sync, handle) = synchronizer(false, &bus);

        assert!(!sync.tick().unwrap());
        assert!(!handle.motor_enable());

        handle.set_ready(true);
        assert!(sync.tick().unwrap());
        assert!(handle.motor_enable());
        assert_eq!(handle.motor_enable_writes(), vec![false, true]);
    }

    #[test]
    fn output_is_written_every_tick_but_published_on_change() {
        let bus = StateBus::default();
        let mut rx = bus.subscribe(Topic::IoState);
        let (mut sync, handle) = synchronizer(true, &bus);

        handle.push_samples([true, false, false, true]);
        let published: Vec<bool> = (0..4).map(|_| sync.tick().unwrap()).collect();

        assert_eq!(published, vec![false, true, false, true]);
        assert_eq!(handle.motor_enable_writes(), vec![true, false, false, true]);
        assert_eq!(rx.drain().len(), 2);
    }

    #[test]
    fn hardware_failure_propagates() {
        let bus = StateBus::default();
        let (mut sync, handle) = synchronizer(true, &bus);
        handle.fail_next_read("gpio chip unavailable");

        assert!(matches!(sync.tick(), Err(PowerError::HardwareFault { .. })));
        assert!(handle.motor_enable_writes().is_empty());
    }

    #[tokio::test]
    async fn run_ticks_periodically() {
        let bus = StateBus::default();
        let (sync, handle) = synchronizer(true, &bus);
        let task = tokio::spawn(sync.run());

        tokio::time::sleep(Duration::from_millis(100)).await;
        task.abort();
        let _ = task.await;

        assert!(handle.reads() >= 2, "expected several ticks, saw {}", handle.reads());
        // Aborting the loop drops the stage, which de-energises the output.
        assert!(!handle.motor_enable());
    }

    #[tokio::test]
    async fn run_stops_on_hardware_failure() {
        let bus = StateBus::default();
        let (sync, handle) = synchronizer(true, &bus);
        handle.fail_next_read("line stuck");

        let result = tokio::time::timeout(Duration::from_secs(1), sync.run()).await;
        assert!(matches!(result, Ok(Err(PowerError::HardwareFault { .. }))));
    }
}
