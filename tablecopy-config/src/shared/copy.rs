use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Settings for writing snapshots into the target database.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CopyConfig {
    /// Maximum number of rows per multi-row `INSERT` statement.
    #[serde(default = "default_insert_batch_size")]
    pub insert_batch_size: usize,
}

impl CopyConfig {
    pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.insert_batch_size == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "copy.insert_batch_size".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            insert_batch_size: default_insert_batch_size(),
        }
    }
}

fn default_insert_batch_size() -> usize {
    CopyConfig::DEFAULT_INSERT_BATCH_SIZE
}
