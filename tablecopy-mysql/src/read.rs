use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryBuilder, BooleanBuilder, Date32Builder, Float32Builder, Float64Builder,
    Int64Builder, StringBuilder, Time64MicrosecondBuilder, TimestampMicrosecondBuilder,
    UInt64Builder,
};
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use sqlx::{Executor, MySqlPool, Row, Statement, mysql::MySqlRow};
use thiserror::Error;
use tracing::{debug, warn};

use crate::db::quote_identifier;
use crate::schema::{ColumnKind, schema_from_columns};

/// Errors raised while reading a table into a record batch.
#[derive(Debug, Error)]
pub enum MySqlReadError {
    #[error("failed to query table `{table}`: {source}")]
    Query {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to build record batch for table `{table}`: {source}")]
    Arrow {
        table: String,
        #[source]
        source: ArrowError,
    },
}

/// Builds the `SELECT` for `table`, projecting `columns` in order when given.
///
/// `None` or an empty list selects every column.
pub fn select_query(table: &str, columns: Option<&[String]>) -> String {
    let projection = match columns {
        Some(columns) if !columns.is_empty() => columns
            .iter()
            .map(|column| quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", "),
        _ => "*".to_string(),
    };

    format!("SELECT {projection} FROM {}", quote_identifier(table))
}

/// Reads a whole table into one record batch.
///
/// The schema comes from the prepared statement, so an empty table still yields a typed batch
/// with zero rows. Values that cannot be decoded as their column's type become nulls.
pub async fn read_table(
    pool: &MySqlPool,
    table: &str,
    columns: Option<&[String]>,
) -> Result<RecordBatch, MySqlReadError> {
    let query = select_query(table, columns);
    let query_error = |source| MySqlReadError::Query {
        table: table.to_string(),
        source,
    };

    let statement = pool.prepare(query.as_str()).await.map_err(query_error)?;
    let (kinds, schema) = schema_from_columns(statement.columns());
    let schema: SchemaRef = Arc::new(schema);

    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .map_err(query_error)?;

    let mut decoders: Vec<ColumnDecoder> = schema
        .fields()
        .iter()
        .zip(kinds)
        .map(|(field, kind)| ColumnDecoder::new(field.name(), kind, rows.len()))
        .collect();

    for (row_index, row) in rows.iter().enumerate() {
        for (column_index, decoder) in decoders.iter_mut().enumerate() {
            decoder.append(table, row, row_index, column_index);
        }
    }

    let arrays: Vec<ArrayRef> = decoders.into_iter().map(ColumnDecoder::finish).collect();
    let batch = RecordBatch::try_new(schema, arrays).map_err(|source| MySqlReadError::Arrow {
        table: table.to_string(),
        source,
    })?;

    debug!(table, rows = batch.num_rows(), columns = batch.num_columns(), "read table");

    Ok(batch)
}

enum ColumnBuilder {
    Boolean(BooleanBuilder),
    Int64(Int64Builder),
    UInt64(UInt64Builder),
    Float32(Float32Builder),
    Float64(Float64Builder),
    Date32(Date32Builder),
    Timestamp(TimestampMicrosecondBuilder),
    Time64(Time64MicrosecondBuilder),
    Binary(BinaryBuilder),
    Utf8(StringBuilder),
}

struct ColumnDecoder {
    name: String,
    kind: ColumnKind,
    builder: ColumnBuilder,
}

impl ColumnDecoder {
    fn new(name: &str, kind: ColumnKind, capacity: usize) -> Self {
        let builder = match kind {
            ColumnKind::Boolean => ColumnBuilder::Boolean(BooleanBuilder::with_capacity(capacity)),
            ColumnKind::Int | ColumnKind::UnsignedInt => {
                ColumnBuilder::Int64(Int64Builder::with_capacity(capacity))
            }
            ColumnKind::UnsignedBigInt => {
                ColumnBuilder::UInt64(UInt64Builder::with_capacity(capacity))
            }
            ColumnKind::Float => ColumnBuilder::Float32(Float32Builder::with_capacity(capacity)),
            ColumnKind::Double => ColumnBuilder::Float64(Float64Builder::with_capacity(capacity)),
            ColumnKind::Date => ColumnBuilder::Date32(Date32Builder::with_capacity(capacity)),
            ColumnKind::DateTime | ColumnKind::Timestamp => ColumnBuilder::Timestamp(
                TimestampMicrosecondBuilder::with_capacity(capacity)
                    .with_data_type(kind.data_type()),
            ),
            ColumnKind::Time => {
                ColumnBuilder::Time64(Time64MicrosecondBuilder::with_capacity(capacity))
            }
            ColumnKind::Binary => {
                ColumnBuilder::Binary(BinaryBuilder::with_capacity(capacity, capacity * 16))
            }
            ColumnKind::Text => {
                ColumnBuilder::Utf8(StringBuilder::with_capacity(capacity, capacity * 16))
            }
        };

        Self {
            name: name.to_string(),
            kind,
            builder,
        }
    }

    fn append(&mut self, table: &str, row: &MySqlRow, row_index: usize, column_index: usize) {
        let cell = Cell {
            table,
            column: &self.name,
            row_index,
        };

        match &mut self.builder {
            ColumnBuilder::Boolean(builder) => {
                builder.append_option(
                    cell.value(row.try_get_unchecked::<Option<i64>, _>(column_index))
                        .map(|value| value != 0),
                );
            }
            ColumnBuilder::Int64(builder) if self.kind == ColumnKind::UnsignedInt => {
                builder.append_option(
                    cell.value(row.try_get_unchecked::<Option<u64>, _>(column_index))
                        .and_then(|value| i64::try_from(value).ok()),
                );
            }
            ColumnBuilder::Int64(builder) => {
                builder.append_option(
                    cell.value(row.try_get_unchecked::<Option<i64>, _>(column_index)),
                );
            }
            ColumnBuilder::UInt64(builder) => {
                builder.append_option(
                    cell.value(row.try_get_unchecked::<Option<u64>, _>(column_index)),
                );
            }
            ColumnBuilder::Float32(builder) => {
                builder.append_option(cell.value(row.try_get::<Option<f32>, _>(column_index)));
            }
            ColumnBuilder::Float64(builder) => {
                builder.append_option(cell.value(row.try_get::<Option<f64>, _>(column_index)));
            }
            ColumnBuilder::Date32(builder) => {
                builder.append_option(
                    cell.value(row.try_get::<Option<NaiveDate>, _>(column_index))
                        .and_then(days_since_epoch),
                );
            }
            ColumnBuilder::Timestamp(builder) => {
                builder.append_option(
                    cell.value(row.try_get::<Option<NaiveDateTime>, _>(column_index))
                        .map(|value| value.and_utc().timestamp_micros()),
                );
            }
            ColumnBuilder::Time64(builder) => {
                builder.append_option(
                    cell.value(row.try_get::<Option<NaiveTime>, _>(column_index))
                        .map(micros_since_midnight),
                );
            }
            ColumnBuilder::Binary(builder) => {
                builder.append_option(
                    cell.value(row.try_get_unchecked::<Option<Vec<u8>>, _>(column_index)),
                );
            }
            ColumnBuilder::Utf8(builder) => {
                builder.append_option(
                    cell.value(row.try_get_unchecked::<Option<Vec<u8>>, _>(column_index))
                        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()),
                );
            }
        }
    }

    fn finish(self) -> ArrayRef {
        match self.builder {
            ColumnBuilder::Boolean(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Int64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::UInt64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Float32(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Float64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Date32(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Timestamp(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Time64(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Binary(mut builder) => Arc::new(builder.finish()),
            ColumnBuilder::Utf8(mut builder) => Arc::new(builder.finish()),
        }
    }
}

/// Position of a value being decoded, for warnings.
struct Cell<'a> {
    table: &'a str,
    column: &'a str,
    row_index: usize,
}

impl Cell<'_> {
    fn value<T>(&self, result: Result<Option<T>, sqlx::Error>) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    table = self.table,
                    column = self.column,
                    row = self.row_index,
                    error = %err,
                    "failed to decode value, storing null"
                );
                None
            }
        }
    }
}

fn days_since_epoch(date: NaiveDate) -> Option<i32> {
    let days = date
        .signed_duration_since(DateTime::UNIX_EPOCH.date_naive())
        .num_days();
    i32::try_from(days).ok()
}

fn micros_since_midnight(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1_000_000 + i64::from(time.nanosecond() / 1_000)
}
