use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// File format produced by the export step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Parquet,
    Avro,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::Csv,
        ExportFormat::Parquet,
        ExportFormat::Avro,
    ];

    /// Subdirectory of the output directory holding files of this format.
    pub fn directory_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Avro => "avro",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.directory_name()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory_name())
    }
}

/// Settings for the export step.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExportConfig {
    /// Root directory; each format writes into its own subdirectory.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_formats")]
    pub formats: Vec<ExportFormat>,
    /// Tables to export. Empty means every table in the source database.
    #[serde(default)]
    pub tables: Vec<String>,
}

impl ExportConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.formats.is_empty() {
            return Err(ValidationError::NoExportFormats);
        }

        if self.tables.iter().any(|table| table.trim().is_empty()) {
            return Err(ValidationError::InvalidFieldValue {
                field: "export.tables".to_string(),
                constraint: "table names must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Directory for files of `format`.
    pub fn format_dir(&self, format: ExportFormat) -> PathBuf {
        self.output_dir.join(format.directory_name())
    }

    /// Enabled formats with duplicates removed, in configured order.
    pub fn enabled_formats(&self) -> Vec<ExportFormat> {
        let mut formats = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            if !formats.contains(format) {
                formats.push(*format);
            }
        }

        formats
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            formats: default_formats(),
            tables: Vec::new(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_formats() -> Vec<ExportFormat> {
    ExportFormat::ALL.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_format() {
        let config: ExportConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.formats, ExportFormat::ALL.to_vec());
        assert!(config.tables.is_empty());
        assert_eq!(config.format_dir(ExportFormat::Avro), PathBuf::from("output/avro"));
    }

    #[test]
    fn formats_deserialize_lowercase() {
        let config: ExportConfig =
            serde_json::from_str(r#"{"formats": ["parquet", "csv", "parquet"]}"#).unwrap();

        assert_eq!(
            config.enabled_formats(),
            vec![ExportFormat::Parquet, ExportFormat::Csv]
        );
    }

    #[test]
    fn empty_formats_are_rejected() {
        let config = ExportConfig {
            formats: vec![],
            ..ExportConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::NoExportFormats)
        ));
    }
}
