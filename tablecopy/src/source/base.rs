use async_trait::async_trait;

use crate::error::EtlResult;
use crate::types::TableSnapshot;

/// A database that tables can be enumerated on and read from.
#[async_trait]
pub trait Source: Send + Sync {
    /// Returns every table name of the source, in catalog order.
    async fn list_tables(&self) -> EtlResult<Vec<String>>;

    /// Reads `table` fully, projecting `columns` in the given order when provided.
    async fn read_table(
        &self,
        table: &str,
        columns: Option<&[String]>,
    ) -> EtlResult<TableSnapshot>;
}
