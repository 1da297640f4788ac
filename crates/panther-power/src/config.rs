//! Validated runtime parameters of the power controller.

use std::time::Duration;

use panther_types::PowerError;

use crate::arbiter::DEFAULT_FRESHNESS_THRESHOLD;

/// Default motor-state synchronizer period (10 Hz).
pub const DEFAULT_SYNC_PERIOD: Duration = Duration::from_millis(100);

/// Parameters consumed by [`bring_up`][crate::controller::bring_up].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerConfig {
    /// Quiet period required on the velocity-command channel before a reset.
    pub freshness_threshold: Duration,
    /// Period of the motor-state synchronizer.
    pub sync_period: Duration,
}

impl PowerConfig {
    /// Build a config from operator-facing units.
    ///
    /// # Errors
    ///
    /// Returns [`PowerError::InvalidConfig`] when the threshold is negative
    /// or not finite, or when the period is zero.
    pub fn from_units(
        freshness_threshold_secs: f64,
        sync_period_ms: u64,
    ) -> Result<Self, PowerError> {
        let freshness_threshold =
            Duration::try_from_secs_f64(freshness_threshold_secs).map_err(|e| {
                PowerError::InvalidConfig(format!(
                    "freshness threshold {freshness_threshold_secs} s is not a valid duration: {e}"
                ))
            })?;
        if sync_period_ms == 0 {
            return Err(PowerError::InvalidConfig(
                "synchronizer period must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            freshness_threshold,
            sync_period: Duration::from_millis(sync_period_ms),
        })
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            freshness_threshold: DEFAULT_FRESHNESS_THRESHOLD,
            sync_period: DEFAULT_SYNC_PERIOD,
        }
    }
}
