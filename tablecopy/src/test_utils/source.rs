use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ErrorKind, EtlResult};
use crate::source::Source;
use crate::types::TableSnapshot;
use crate::{bail, etl_error};

/// [`Source`] over record batches held in memory.
///
/// Tables are listed in name order, like the MySQL catalog query. Every read is recorded so
/// tests can check which tables a run touched.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: Arc<Mutex<BTreeMap<String, RecordBatch>>>,
    reads: Arc<Mutex<Vec<String>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_table(&self, name: impl Into<String>, batch: RecordBatch) {
        self.tables.lock().await.insert(name.into(), batch);
    }

    pub async fn with_table(self, name: impl Into<String>, batch: RecordBatch) -> Self {
        self.insert_table(name, batch).await;
        self
    }

    /// Names of the tables read so far, in read order.
    pub async fn reads(&self) -> Vec<String> {
        self.reads.lock().await.clone()
    }
}

#[async_trait]
impl Source for MemorySource {
    async fn list_tables(&self) -> EtlResult<Vec<String>> {
        Ok(self.tables.lock().await.keys().cloned().collect())
    }

    async fn read_table(
        &self,
        table: &str,
        columns: Option<&[String]>,
    ) -> EtlResult<TableSnapshot> {
        let batch = {
            let tables = self.tables.lock().await;
            let Some(batch) = tables.get(table) else {
                bail!(ErrorKind::SourceQueryFailed, "Table does not exist", table);
            };
            batch.clone()
        };

        self.reads.lock().await.push(table.to_string());

        let batch = match columns {
            Some(columns) if !columns.is_empty() => project(table, &batch, columns)?,
            _ => batch,
        };

        Ok(TableSnapshot::new(table, batch))
    }
}

fn project(table: &str, batch: &RecordBatch, columns: &[String]) -> EtlResult<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays = Vec::with_capacity(columns.len());

    for column in columns {
        let index = schema.index_of(column).map_err(|err| {
            etl_error!(
                ErrorKind::SourceQueryFailed,
                "Unknown column",
                format!("{table}.{column}"),
                source: err
            )
        })?;
        fields.push(schema.field(index).clone());
        arrays.push(batch.column(index).clone());
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
