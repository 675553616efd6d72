use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings for the daily trigger.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleConfig {
    /// Local wall-clock time of the daily run, `HH:MM` or `HH:MM:SS`.
    #[serde(default = "default_at")]
    pub at: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Skip the remaining steps of a run after the first failing one.
    #[serde(default)]
    pub halt_on_failure: bool,
}

impl ScheduleConfig {
    pub const DEFAULT_AT: &'static str = "17:26";

    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

    /// Parses [`ScheduleConfig::at`].
    pub fn time(&self) -> Result<NaiveTime, ValidationError> {
        let at = self.at.trim();
        NaiveTime::parse_from_str(at, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(at, "%H:%M"))
            .map_err(|_| ValidationError::InvalidScheduleTime(self.at.clone()))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.time()?;

        if self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "schedule.poll_interval_secs".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            at: default_at(),
            poll_interval_secs: default_poll_interval_secs(),
            halt_on_failure: false,
        }
    }
}

fn default_at() -> String {
    ScheduleConfig::DEFAULT_AT.to_string()
}

fn default_poll_interval_secs() -> u64 {
    ScheduleConfig::DEFAULT_POLL_INTERVAL_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(at: &str) -> ScheduleConfig {
        ScheduleConfig {
            at: at.to_string(),
            ..ScheduleConfig::default()
        }
    }

    #[test]
    fn default_time_is_parsed() {
        assert_eq!(
            ScheduleConfig::default().time().unwrap(),
            NaiveTime::from_hms_opt(17, 26, 0).unwrap()
        );
    }

    #[test]
    fn seconds_are_optional() {
        assert_eq!(
            schedule("06:05:30").time().unwrap(),
            NaiveTime::from_hms_opt(6, 5, 30).unwrap()
        );
        assert_eq!(
            schedule(" 23:59 ").time().unwrap(),
            NaiveTime::from_hms_opt(23, 59, 0).unwrap()
        );
    }

    #[test]
    fn invalid_times_are_rejected() {
        for at in ["", "25:00", "noon", "12"] {
            assert!(matches!(
                schedule(at).validate(),
                Err(ValidationError::InvalidScheduleTime(_))
            ));
        }
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = ScheduleConfig {
            poll_interval_secs: 0,
            ..ScheduleConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidFieldValue { .. })
        ));
    }
}
