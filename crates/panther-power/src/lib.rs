//! `panther-power` – Power & E-Stop safety controller
//!
//! Owns the emergency-stop latch, mirrors the power-stage-ready line onto the
//! motor-enable output, and arbitrates E-Stop reset requests.
//!
//! # Modules
//!
//! - [`controller`] – [`PowerControl`]: the lock-guarded safety core
//!   (command freshness, fault flags, E-Stop) and [`bring_up`], which samples
//!   the hardware once and wires everything together.
//! - [`arbiter`] – [`ResetArbiter`]: the ordered freshness-then-fault decision
//!   table for reset requests.
//! - [`e_stop`] – [`EStopLatch`]: the latched E-Stop state and its
//!   publication rules.
//! - [`freshness`] – [`CommandFreshness`][freshness::CommandFreshness]:
//!   timestamp of the last velocity command.
//! - [`fault`] – [`FaultTracker`][fault::FaultTracker]: CAN error flags of the
//!   front and rear motor controllers.
//! - [`io_state`] – [`IoStateAggregator`][io_state::IoStateAggregator]:
//!   change-detecting publisher of the digital-IO snapshot.
//! - [`synchronizer`] – [`MotorStateSynchronizer`]: the fixed-rate
//!   hardware-to-output loop.
//! - [`config`] – [`PowerConfig`]: validated runtime parameters.

pub mod arbiter;
pub mod config;
pub mod controller;
pub mod e_stop;
pub mod fault;
pub mod freshness;
pub mod io_state;
pub mod synchronizer;

pub use arbiter::{ResetArbiter, ResetDecision, ResetDenial};
pub use config::PowerConfig;
pub use controller::{PowerControl, ResetOutcome, bring_up};
pub use e_stop::{EStopLatch, EStopState};
pub use synchronizer::MotorStateSynchronizer;

use std::sync::{Mutex, MutexGuard, PoisonError};

// The guarded values are plain data updated in single assignments, so a panic
// in another holder cannot leave them half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
