//! SLA thresholds, business calendar and sweep timing.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Deadline and escalation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlaPolicy {
    /// Escalate to `warning` when this many hours or fewer remain.
    #[serde(default = "default_warning_hours")]
    pub warning_hours: u32,
    /// Escalate to `critical` when this many hours or fewer remain.
    #[serde(default = "default_critical_hours")]
    pub critical_hours: u32,
    /// Time of day (UTC) at which a deadline date expires.
    #[serde(default = "default_cutoff_time")]
    pub cutoff_time: NaiveTime,
    /// Non-business dates in addition to weekends.
    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
    /// Seconds between background sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Files re-evaluated per sweep batch before checking for shutdown.
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: usize,
    /// Attempts per optimistic write before giving up.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
}

fn default_warning_hours() -> u32 {
    24
}

fn default_critical_hours() -> u32 {
    4
}

fn default_cutoff_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_sweep_batch_size() -> usize {
    100
}

fn default_max_write_attempts() -> u32 {
    5
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            warning_hours: default_warning_hours(),
            critical_hours: default_critical_hours(),
            cutoff_time: default_cutoff_time(),
            holidays: BTreeSet::new(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_batch_size: default_sweep_batch_size(),
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

/// Escalation thresholds in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationThresholds {
    /// Remaining seconds at or below which the level is at least `warning`.
    pub warning_secs: i64,
    /// Remaining seconds at or below which the level is at least `critical`.
    pub critical_secs: i64,
}

impl Default for EscalationThresholds {
    fn default() -> Self {
        SlaPolicy::default().thresholds()
    }
}

impl SlaPolicy {
    /// Check that thresholds are ordered and timings are non-zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.critical_hours == 0 {
            return Err(ConfigError::InvalidSla {
                key: "critical_hours",
                detail: "must be positive".into(),
            });
        }
        if self.warning_hours <= self.critical_hours {
            return Err(ConfigError::InvalidSla {
                key: "warning_hours",
                detail: format!(
                    "must exceed critical_hours ({} <= {})",
                    self.warning_hours, self.critical_hours
                ),
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidSla {
                key: "sweep_interval_secs",
                detail: "must be positive".into(),
            });
        }
        if self.sweep_batch_size == 0 {
            return Err(ConfigError::InvalidSla {
                key: "sweep_batch_size",
                detail: "must be positive".into(),
            });
        }
        if self.max_write_attempts == 0 {
            return Err(ConfigError::InvalidSla {
                key: "max_write_attempts",
                detail: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Thresholds in seconds.
    pub fn thresholds(&self) -> EscalationThresholds {
        EscalationThresholds {
            warning_secs: i64::from(self.warning_hours) * 3600,
            critical_secs: i64::from(self.critical_hours) * 3600,
        }
    }

    /// Interval between sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
