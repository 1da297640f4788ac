//! Configuration – reads `~/.panther/power_control.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use panther_power::PowerConfig;
use panther_types::PowerError;

/// Operator configuration stored in `~/.panther/power_control.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Quiet period on `/cmd_vel` required before an E-Stop reset [s].
    #[serde(default = "default_freshness_threshold_secs")]
    pub freshness_threshold_secs: f64,

    /// Motor-state synchronizer period [ms].
    #[serde(default = "default_sync_period_ms")]
    pub sync_period_ms: u64,

    /// Per-topic buffer of the state bus.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Initial level of the simulated power-stage-ready line.
    #[serde(default = "default_sim_power_stage_ready")]
    pub sim_power_stage_ready: bool,
}

fn default_freshness_threshold_secs() -> f64 {
    2.0
}
fn default_sync_period_ms() -> u64 {
    100
}
fn default_bus_capacity() -> usize {
    64
}
fn default_sim_power_stage_ready() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            freshness_threshold_secs: default_freshness_threshold_secs(),
            sync_period_ms: default_sync_period_ms(),
            bus_capacity: default_bus_capacity(),
            sim_power_stage_ready: default_sim_power_stage_ready(),
        }
    }
}

impl Config {
    /// Validate into the controller's runtime parameters.
    pub fn power_config(&self) -> Result<PowerConfig, PowerError> {
        if self.bus_capacity == 0 {
            return Err(PowerError::InvalidConfig(
                "bus capacity must be greater than zero".to_string(),
            ));
        }
        PowerConfig::from_units(self.freshness_threshold_secs, self.sync_period_ms)
    }
}

/// Return the config path: `PANTHER_CONFIG` if set, else
/// `~/.panther/power_control.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("PANTHER_CONFIG") {
        return PathBuf::from(p);
    }
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".panther").join("power_control.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Default config with `PANTHER_*` environment overrides applied.  Used when
/// no config file exists or the file cannot be read.
pub fn defaults_with_env() -> Config {
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg);
    cfg
}

/// Apply `PANTHER_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `PANTHER_FRESHNESS_THRESHOLD_SECS` | `freshness_threshold_secs` |
/// | `PANTHER_SYNC_PERIOD_MS` | `sync_period_ms` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("PANTHER_FRESHNESS_THRESHOLD_SECS")
        && let Ok(secs) = v.parse::<f64>()
    {
        cfg.freshness_threshold_secs = secs;
    }
    if let Ok(v) = std::env::var("PANTHER_SYNC_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.sync_period_ms = ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_match_deployed_node() {
        let cfg = Config::default();
        assert_eq!(cfg.freshness_threshold_secs, 2.0);
        assert_eq!(cfg.sync_period_ms, 100);
        let power = cfg.power_config().unwrap();
        assert_eq!(power.freshness_threshold, Duration::from_secs(2));
        assert_eq!(power.sync_period, Duration::from_millis(100));
    }

    #[test]
    fn config_path_points_to_panther_dir() {
        let p = config_path_for_home("/home/robot");
        assert!(p.to_string_lossy().contains(".panther"));
        assert!(p.to_string_lossy().ends_with("power_control.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("power_control.toml");
        fs::write(&path, "sync_period_ms = 50\n").expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.sync_period_ms, 50);
        assert_eq!(cfg.bus_capacity, 64);
        assert!(cfg.sim_power_stage_ready);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("power_control.toml");
        fs::write(&path, "sync_period_ms = \"fast\"\n").expect("write");
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn invalid_values_are_rejected_on_validation() {
        let cfg = Config {
            freshness_threshold_secs: -1.0,
            ..Config::default()
        };
        assert!(matches!(cfg.power_config(), Err(PowerError::InvalidConfig(_))));

        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert!(cfg.power_config().is_err());
    }

    #[test]
    fn apply_env_overrides_changes_values_and_ignores_garbage() {
        // SAFETY: only this test touches these variables.
        unsafe {
            std::env::set_var("PANTHER_FRESHNESS_THRESHOLD_SECS", "3.5");
            std::env::set_var("PANTHER_SYNC_PERIOD_MS", "not-a-number");
        }
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.freshness_threshold_secs, 3.5);
        assert_eq!(cfg.sync_period_ms, 100);

        // The fallback used for a missing or unreadable file honours them too.
        let fallback = defaults_with_env();
        assert_eq!(fallback.freshness_threshold_secs, 3.5);
        assert_eq!(fallback.sync_period_ms, 100);
        unsafe {
            std::env::remove_var("PANTHER_FRESHNESS_THRESHOLD_SECS");
            std::env::remove_var("PANTHER_SYNC_PERIOD_MS");
        }
    }
}
