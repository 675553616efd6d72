use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

/// A whole table read into memory.
///
/// Column order and row count are fixed when the snapshot is read. Every destination of a run
/// receives the same snapshot unmodified.
#[derive(Debug, Clone)]
pub struct TableSnapshot {
    name: String,
    batch: RecordBatch,
}

impl TableSnapshot {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// Name of the source table, reused as the destination table and file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect()
    }
}
