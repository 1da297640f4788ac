//! [`CommandFreshness`] – arrival tracker for the velocity-command channel.
//!
//! Every velocity command overwrites a single monotonic timestamp.  The
//! [`ResetArbiter`][crate::arbiter::ResetArbiter] compares the age of that
//! timestamp against its freshness threshold: a young timestamp means motion
//! commands are still in flight and motors must not be re-enabled.
//!
//! All operations take `now` explicitly so callers decide which clock reading
//! a decision is made against.

use std::time::{Duration, Instant};

/// Timestamp of the most recently received velocity command.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use panther_power::freshness::CommandFreshness;
///
/// let boot = Instant::now();
/// let mut freshness = CommandFreshness::new(boot);
/// assert_eq!(freshness.age_since_last_command(boot), Duration::ZERO);
///
/// let later = boot + Duration::from_secs(3);
/// assert_eq!(freshness.age_since_last_command(later), Duration::from_secs(3));
///
/// freshness.record_command_received(later);
/// assert_eq!(freshness.age_since_last_command(later), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CommandFreshness {
    last_command: Instant,
}

impl CommandFreshness {
    /// Start tracking as if a command had just been seen at `now`, so reset
    /// requests fail until the freshness window has elapsed after boot.
    pub fn new(now: Instant) -> Self {
        Self { last_command: now }
    }

    /// Record a velocity command arriving at `now`.  Unconditional overwrite.
    pub fn record_command_received(&mut self, now: Instant) {
        self.last_command = now;
    }

    /// Time elapsed between the last command and `now`.
    ///
    /// Saturates at zero when `now` precedes the stored timestamp.
    pub fn age_since_last_command(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_command)
    }

    /// Instant of the most recent command (or of construction).
    pub fn last_command(&self) -> Instant {
        self.last_command
    }
}
