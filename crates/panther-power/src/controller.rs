//! [`PowerControl`] – the lock-guarded safety core and its bring-up.
//!
//! The command timestamp, the fault flags, and the E-Stop latch form one
//! [`SafetyState`] behind a single mutex.  Every event that reads or writes
//! any of them takes that lock for its whole duration, so a reset decision and
//! the E-Stop mutation it authorises happen in one critical section: a
//! command or status update either lands entirely before the decision or
//! entirely after the mutation.
//!
//! The IO snapshot is not part of that unit.  It has a single writer (the
//! [`MotorStateSynchronizer`]) and its own lock.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use panther_hal::SimPowerStage;
//! use panther_middleware::StateBus;
//! use panther_power::{PowerConfig, ResetOutcome, bring_up};
//!
//! let boot = Instant::now();
//! let (control, _sync) = bring_up(
//!     Box::new(SimPowerStage::new(false)),
//!     StateBus::default(),
//!     &PowerConfig::default(),
//!     boot,
//! )
//! .unwrap();
//! assert!(control.e_stop_active());
//!
//! control.record_status(false, false);
//! let outcome = control.reset(boot + Duration::from_secs(3));
//! assert_eq!(outcome, ResetOutcome::Reset);
//! assert!(!control.e_stop_active());
//! ```

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use panther_hal::PowerStage;
use panther_middleware::StateBus;
use panther_types::{IoState, MotorControllersState, PowerError, ServiceResponse};
use tracing::{info, warn};

use crate::arbiter::{ResetArbiter, ResetDecision, ResetDenial};
use crate::config::PowerConfig;
use crate::e_stop::EStopLatch;
use crate::fault::FaultTracker;
use crate::freshness::CommandFreshness;
use crate::io_state::IoStateAggregator;
use crate::lock;
use crate::synchronizer::MotorStateSynchronizer;

const RESET_SUCCESS_MESSAGE: &str = "E-STOP reset successful";
const TRIGGER_SUCCESS_MESSAGE: &str = "E-STOP triggered successful";

/// Outcome of [`PowerControl::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Approved; the E-Stop went from active to cleared.
    Reset,
    /// Approved; the E-Stop was already cleared, nothing changed.
    AlreadyCleared,
    /// Refused for the given reason; nothing changed.
    Denied(ResetDenial),
}

impl ResetOutcome {
    pub fn is_success(self) -> bool {
        !matches!(self, ResetOutcome::Denied(_))
    }
}

impl From<ResetOutcome> for ServiceResponse {
    fn from(outcome: ResetOutcome) -> Self {
        match outcome {
            ResetOutcome::Reset | ResetOutcome::AlreadyCleared => {
                ServiceResponse::ok(RESET_SUCCESS_MESSAGE)
            }
            ResetOutcome::Denied(denial) => ServiceResponse::failed(denial.message()),
        }
    }
}

/// Everything a reset decision reads or writes, guarded as one unit.
#[derive(Debug)]
struct SafetyState {
    freshness: CommandFreshness,
    faults: FaultTracker,
    e_stop: EStopLatch,
}

/// Cloneable handle to the running power controller.
///
/// All clones share the same state; hand one to every event source.
#[derive(Clone, Debug)]
pub struct PowerControl {
    safety: Arc<Mutex<SafetyState>>,
    io_state: Arc<Mutex<IoStateAggregator>>,
    arbiter: ResetArbiter,
    bus: StateBus,
}

/// Bring the controller up against `stage`.
///
/// Samples the power-stage-ready line once and derives both the initial
/// E-Stop state (not ready ⇒ active) and the IO baseline from it.  The E-Stop
/// is published first, then the IO baseline.  The returned synchronizer owns
/// the stage and must be driven by the caller, usually by spawning
/// [`MotorStateSynchronizer::run`].
///
/// # Errors
///
/// Returns [`PowerError::HardwareFault`] if the initial sample fails.
pub fn bring_up(
    mut stage: Box<dyn PowerStage>,
    bus: StateBus,
    config: &PowerConfig,
    now: Instant,
) -> Result<(PowerControl, MotorStateSynchronizer), PowerError> {
    let ready = stage.power_stage_ready()?;

    let e_stop = EStopLatch::new(ready, bus.clone());
    let mut io_state = IoStateAggregator::new(ready, bus.clone());
    io_state.publish_initial();
    let io_state = Arc::new(Mutex::new(io_state));

    let control = PowerControl {
        safety: Arc::new(Mutex::new(SafetyState {
            freshness: CommandFreshness::new(now),
            faults: FaultTracker::new(),
            e_stop,
        })),
        io_state: Arc::clone(&io_state),
        arbiter: ResetArbiter::new(config.freshness_threshold),
        bus,
    };
    let synchronizer = MotorStateSynchronizer::new(stage, io_state, config.sync_period);

    info!(
        power_stage_ready = ready,
        freshness_threshold_ms = config.freshness_threshold.as_millis() as u64,
        sync_period_ms = config.sync_period.as_millis() as u64,
        "power control started"
    );
    Ok((control, synchronizer))
}

impl PowerControl {
    /// A velocity command arrived at `now`.
    pub fn on_velocity_command(&self, now: Instant) {
        lock(&self.safety).freshness.record_command_received(now);
    }

    /// A motor-controller status report arrived.
    pub fn on_motor_controllers_state(&self, state: &MotorControllersState) {
        lock(&self.safety).faults.record_driver_state(state);
    }

    /// Overwrite the front/rear CAN error flags.
    pub fn record_status(&self, front_error: bool, rear_error: bool) {
        lock(&self.safety).faults.record_status(front_error, rear_error);
    }

    /// Assert the E-Stop.  Always succeeds and always publishes.
    pub fn trigger(&self) -> ServiceResponse {
        lock(&self.safety).e_stop.trigger();
        ServiceResponse::ok(TRIGGER_SUCCESS_MESSAGE)
    }

    /// Try to clear the E-Stop at `now`.
    ///
    /// Freshness and fault state are read, evaluated, and acted on without
    /// releasing the lock.
    pub fn reset(&self, now: Instant) -> ResetOutcome {
        let mut safety = lock(&self.safety);
        match self.arbiter.evaluate(now, &safety.freshness, &safety.faults) {
            ResetDecision::Deny(denial) => {
                warn!(reason = ?denial, "E-Stop reset denied");
                ResetOutcome::Denied(denial)
            }
            ResetDecision::Approve => {
                if safety.e_stop.clear() {
                    ResetOutcome::Reset
                } else {
                    ResetOutcome::AlreadyCleared
                }
            }
        }
    }

    pub fn e_stop_active(&self) -> bool {
        lock(&self.safety).e_stop.is_active()
    }

    pub fn has_fault(&self) -> bool {
        lock(&self.safety).faults.has_fault()
    }

    /// Age of the last velocity command as seen at `now`.
    pub fn command_age(&self, now: Instant) -> Duration {
        lock(&self.safety).freshness.age_since_last_command(now)
    }

    /// Current IO snapshot.
    pub fn io_state(&self) -> IoState {
        lock(&self.io_state).snapshot()
    }

    pub fn freshness_threshold(&self) -> Duration {
        self.arbiter.freshness_threshold()
    }

    /// The bus this controller publishes on.
    pub fn bus(&self) -> &StateBus {
        &self.bus
    }
}
