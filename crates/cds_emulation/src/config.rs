//! Emulation configuration.

use crate::error::{EmulationError, EmulationResult};
use cds_core::time::duration_ms;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval between "waiting for finalization" reports
pub const DEFAULT_WAIT_REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Minimum simulated time between replay progress reports
pub const DEFAULT_REPLAY_REPORT_INTERVAL: Duration = Duration::from_secs(10);

/// Upper bound on synthesized in-progress snapshots per run
pub const DEFAULT_MAX_PROGRESS_STEPS: usize = 100;

/// Emulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmulationConfig {
    /// Wall clock instant mapped to contest offset zero
    #[serde(default = "Utc::now")]
    pub start_time: DateTime<Utc>,
    /// Speed multiplier, 1.0 replays in real time
    #[serde(default = "default_speed")]
    pub emulation_speed: f64,
    /// Real time between waiting reports
    #[serde(with = "duration_ms", default = "default_wait_report_interval")]
    pub wait_report_interval: Duration,
    /// Simulated time between replay progress reports
    #[serde(with = "duration_ms", default = "default_replay_report_interval")]
    pub replay_report_interval: Duration,
    /// Cap on synthesized progress snapshots per run
    #[serde(default = "default_max_progress_steps")]
    pub max_progress_steps: usize,
    /// Seed for judging progress synthesis; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

const fn default_speed() -> f64 {
    1.0
}

const fn default_wait_report_interval() -> Duration {
    DEFAULT_WAIT_REPORT_INTERVAL
}

const fn default_replay_report_interval() -> Duration {
    DEFAULT_REPLAY_REPORT_INTERVAL
}

const fn default_max_progress_steps() -> usize {
    DEFAULT_MAX_PROGRESS_STEPS
}

impl EmulationConfig {
    /// Create a config with default reporting settings
    #[must_use]
    pub fn new(start_time: DateTime<Utc>, emulation_speed: f64) -> Self {
        Self {
            start_time,
            emulation_speed,
            wait_report_interval: DEFAULT_WAIT_REPORT_INTERVAL,
            replay_report_interval: DEFAULT_REPLAY_REPORT_INTERVAL,
            max_progress_steps: DEFAULT_MAX_PROGRESS_STEPS,
            seed: None,
        }
    }

    /// Set the synthesis seed
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the per-run progress step cap
    #[must_use]
    pub fn with_max_progress_steps(mut self, steps: usize) -> Self {
        self.max_progress_steps = steps;
        self
    }

    /// Set both report intervals
    #[must_use]
    pub fn with_report_intervals(mut self, wait: Duration, replay: Duration) -> Self {
        self.wait_report_interval = wait;
        self.replay_report_interval = replay;
        self
    }

    /// Parse a JSON config document
    ///
    /// # Errors
    ///
    /// Returns error if the document is malformed
    pub fn from_json(input: &str) -> EmulationResult<Self> {
        serde_json::from_str(input).map_err(|err| EmulationError::InvalidConfig {
            field: "config",
            reason: err.to_string(),
        })
    }

    /// Check the config before any work starts
    ///
    /// # Errors
    ///
    /// Returns error on a non-positive or non-finite speed, a zero report
    /// interval, or a zero step cap
    pub fn validate(&self) -> EmulationResult<()> {
        validate_speed(self.emulation_speed)?;
        if self.wait_report_interval.is_zero() {
            return Err(EmulationError::InvalidConfig {
                field: "wait_report_interval",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.replay_report_interval.is_zero() {
            return Err(EmulationError::InvalidConfig {
                field: "replay_report_interval",
                reason: "must be non-zero".to_string(),
            });
        }
        if self.max_progress_steps == 0 {
            return Err(EmulationError::InvalidConfig {
                field: "max_progress_steps",
                reason: "must allow at least one step".to_string(),
            });
        }
        Ok(())
    }
}

/// Check an emulation speed
///
/// # Errors
///
/// Returns error unless `speed` is finite and positive
pub fn validate_speed(speed: f64) -> EmulationResult<()> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(EmulationError::invalid_speed(speed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 18, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = EmulationConfig::new(start(), 10.0);
        assert_eq!(config.wait_report_interval, Duration::from_secs(1));
        assert_eq!(config.replay_report_interval, Duration::from_secs(10));
        assert_eq!(config.max_progress_steps, 100);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_speed() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = EmulationConfig::new(start(), speed);
            assert!(matches!(
                config.validate(),
                Err(EmulationError::InvalidConfig {
                    field: "emulation_speed",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_rejects_zero_intervals_and_cap() {
        let config = EmulationConfig::new(start(), 1.0)
            .with_report_intervals(Duration::ZERO, Duration::from_secs(10));
        assert!(config.validate().is_err());

        let config = EmulationConfig::new(start(), 1.0).with_max_progress_steps(0);
        assert!(matches!(
            config.validate(),
            Err(EmulationError::InvalidConfig {
                field: "max_progress_steps",
                ..
            })
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EmulationConfig::from_json(
            r#"{"start_time":"2024-04-18T09:00:00Z","emulation_speed":20.0,"seed":7}"#,
        )
        .unwrap();
        assert_eq!(config.start_time, start());
        assert_eq!(config.emulation_speed, 20.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.replay_report_interval, DEFAULT_REPLAY_REPORT_INTERVAL);
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(EmulationConfig::from_json("{").is_err());
    }
}
