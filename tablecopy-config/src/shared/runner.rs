use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::Config;
use crate::shared::{
    CopyConfig, ExportConfig, MetricsConfig, MySqlConnectionConfig,
    MySqlConnectionConfigWithoutSecrets, ScheduleConfig, TableColumns, ValidationError,
};

/// Complete configuration for the runner binary.
///
/// Loaded once at startup and handed to every step. `source` is read by all steps; `target`
/// receives the copy and transfer steps.
///
/// This intentionally does not implement [`Serialize`] to avoid leaking passwords.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    pub source: MySqlConnectionConfig,
    pub target: MySqlConnectionConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub copy: CopyConfig,
    /// Tables and columns moved by the transfer step.
    #[serde(default)]
    pub selection: Vec<TableColumns>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.source.validate("source")?;
        self.target.validate("target")?;
        self.export.validate()?;
        self.copy.validate()?;
        self.schedule.validate()?;

        let mut seen = HashSet::new();
        for entry in &self.selection {
            if entry.columns.is_empty() {
                return Err(ValidationError::EmptySelection(entry.table.clone()));
            }
            if !seen.insert(entry.table.as_str()) {
                return Err(ValidationError::DuplicateSelection(entry.table.clone()));
            }
        }

        Ok(())
    }
}

impl Config for RunnerConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &["export.formats", "export.tables"];
}

/// Same as [`RunnerConfig`] but without secrets, safe to log at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfigWithoutSecrets {
    pub source: MySqlConnectionConfigWithoutSecrets,
    pub target: MySqlConnectionConfigWithoutSecrets,
    pub export: ExportConfig,
    pub copy: CopyConfig,
    pub selection: Vec<TableColumns>,
    pub schedule: ScheduleConfig,
    pub metrics: MetricsConfig,
}

impl From<RunnerConfig> for RunnerConfigWithoutSecrets {
    fn from(value: RunnerConfig) -> Self {
        RunnerConfigWithoutSecrets {
            source: value.source.into(),
            target: value.target.into(),
            export: value.export,
            copy: value.copy,
            selection: value.selection,
            schedule: value.schedule,
            metrics: value.metrics,
        }
    }
}
