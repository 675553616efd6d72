use async_trait::async_trait;

use crate::bail;
use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::types::TableSnapshot;

/// Destination that fails every write, or only writes of one table.
#[derive(Debug, Clone, Default)]
pub struct FailingDestination {
    table: Option<String>,
}

impl FailingDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
        }
    }
}

#[async_trait]
impl Destination for FailingDestination {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn write_table(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        match &self.table {
            Some(table) if table != snapshot.name() => Ok(()),
            _ => bail!(
                ErrorKind::DestinationError,
                "Write rejected",
                snapshot.name()
            ),
        }
    }
}
