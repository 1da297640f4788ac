//! [`ResetArbiter`] – decides whether an E-Stop reset may succeed.
//!
//! The arbiter runs **two checks in order**; the first one that fails decides
//! the outcome:
//!
//! 1. **Command quiet period**: the last velocity command must be older than
//!    the freshness threshold.  Otherwise a motion command may still be in
//!    flight and re-enabling the motors would act on it.
//! 2. **Motor-controller link**: neither motor controller may report a CAN
//!    communication error.
//!
//! The arbiter is pure: it reads the tracker values it is handed and never
//! mutates them.  The caller must hold the lock guarding those trackers for
//! the whole read-decide-write sequence.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use panther_power::arbiter::{ResetArbiter, ResetDecision, ResetDenial};
//! use panther_power::fault::FaultTracker;
//! use panther_power::freshness::CommandFreshness;
//!
//! let t0 = Instant::now();
//! let arbiter = ResetArbiter::new(Duration::from_secs(2));
//! let freshness = CommandFreshness::new(t0);
//! let mut faults = FaultTracker::new();
//! faults.record_status(false, false);
//!
//! assert_eq!(
//!     arbiter.evaluate(t0, &freshness, &faults),
//!     ResetDecision::Deny(ResetDenial::CommandsActive)
//! );
//! assert_eq!(
//!     arbiter.evaluate(t0 + Duration::from_millis(2100), &freshness, &faults),
//!     ResetDecision::Approve
//! );
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use crate::fault::FaultTracker;
use crate::freshness::CommandFreshness;

/// Default quiet period required on the velocity-command channel.
pub const DEFAULT_FRESHNESS_THRESHOLD: Duration = Duration::from_secs(2);

/// Why a reset request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDenial {
    /// Velocity commands arrived within the freshness threshold.
    CommandsActive,
    /// At least one motor controller reports a CAN communication error.
    MotorControllerFault,
}

impl ResetDenial {
    /// Operator-facing explanation.
    pub fn message(self) -> &'static str {
        match self {
            ResetDenial::CommandsActive => {
                "E-STOP reset failed, messages are still published on /cmd_vel topic!"
            }
            ResetDenial::MotorControllerFault => {
                "E-STOP reset failed, unable to communicate with motor controllers! \
                 Please check connection with motor controllers."
            }
        }
    }
}

impl fmt::Display for ResetDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of [`ResetArbiter::evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    Approve,
    Deny(ResetDenial),
}

/// Pure reset decision function parameterised by the freshness threshold.
#[derive(Debug, Clone, Copy)]
pub struct ResetArbiter {
    freshness_threshold: Duration,
}

impl ResetArbiter {
    pub fn new(freshness_threshold: Duration) -> Self {
        Self {
            freshness_threshold,
        }
    }

    /// The configured quiet period.
    pub fn freshness_threshold(&self) -> Duration {
        self.freshness_threshold
    }

    /// Evaluate a reset request at `now`.
    ///
    /// | Condition (first match wins) | Decision |
    /// |---|---|
    /// | command age `<=` threshold | `Deny(CommandsActive)` |
    /// | `faults.has_fault()` | `Deny(MotorControllerFault)` |
    /// | otherwise | `Approve` |
    pub fn evaluate(
        &self,
        now: Instant,
        freshness: &CommandFreshness,
        faults: &FaultTracker,
    ) -> ResetDecision {
        if freshness.age_since_last_command(now) <= self.freshness_threshold {
            return ResetDecision::Deny(ResetDenial::CommandsActive);
        }
        if faults.has_fault() {
            return ResetDecision::Deny(ResetDenial::MotorControllerFault);
        }
        ResetDecision::Approve
    }
}

impl Default for ResetArbiter {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> FaultTracker {
        let mut faults = FaultTracker::new();
        faults.record_status(false, false);
        faults
    }

    #[test]
    fn default_threshold_is_two_seconds() {
        assert_eq!(
            ResetArbiter::default().freshness_threshold(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn recent_command_denies() {
        let t0 = Instant::now();
        let arbiter = ResetArbiter::default();
        let freshness = CommandFreshness::new(t0);
        assert_eq!(
            arbiter.evaluate(t0, &freshness, &healthy()),
            ResetDecision::Deny(ResetDenial::CommandsActive)
        );
    }

    #[test]
    fn age_equal_to_threshold_still_denies() {
        let t0 = Instant::now();
        let arbiter = ResetArbiter::default();
        let freshness = CommandFreshness::new(t0);
        assert_eq!(
            arbiter.evaluate(t0 + Duration::from_secs(2), &freshness, &healthy()),
            ResetDecision::Deny(ResetDenial::CommandsActive)
        );
    }

    #[test]
    fn quiet_channel_and_no_fault_approves() {
        let t0 = Instant::now();
        let arbiter = ResetArbiter::default();
        let freshness = CommandFreshness::new(t0);
        assert_eq!(
            arbiter.evaluate(t0 + Duration::from_millis(2100), &freshness, &healthy()),
            ResetDecision::Approve
        );
    }

    #[test]
    fn fault_denies_once_channel_is_quiet() {
        let t0 = Instant::now();
        let arbiter = ResetArbiter::default();
        let freshness = CommandFreshness::new(t0);
        let mut faults = FaultTracker::new();
        faults.record_status(false, true);
        assert_eq!(
            arbiter.evaluate(t0 + Duration::from_secs(3), &freshness, &faults),
            ResetDecision::Deny(ResetDenial::MotorControllerFault)
        );
    }

    #[test]
    fn freshness_check_wins_over_fault() {
        let t0 = Instant::now();
        let arbiter = ResetArbiter::default();
        let freshness = CommandFreshness::new(t0);
        let faults = FaultTracker::new();
        assert_eq!(
            arbiter.evaluate(t0, &freshness, &faults),
            ResetDecision::Deny(ResetDenial::CommandsActive)
        );
    }

    #[test]
    fn custom_threshold_is_honoured() {
        let t0 = Instant::now();
        let arbiter = ResetArbiter::new(Duration::from_millis(500));
        let freshness = CommandFreshness::new(t0);
        assert_eq!(
            arbiter.evaluate(t0 + Duration::from_millis(600), &freshness, &healthy()),
            ResetDecision::Approve
        );
    }

    #[test]
    fn denial_messages_are_distinct() {
        let active = ResetDenial::CommandsActive.to_string();
        let fault = ResetDenial::MotorControllerFault.to_string();
        assert!(active.contains("/cmd_vel"));
        assert!(fault.contains("motor controllers"));
        assert_ne!(active, fault);
    }
}
