use arrow::array::{
    Array, ArrayRef, AsArray, BinaryArray, BooleanArray, Date32Array, Float32Array, Float64Array,
    Int64Array, StringArray, Time64MicrosecondArray, TimestampMicrosecondArray, UInt64Array,
};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int64Type, Time64MicrosecondType, TimeUnit,
    TimestampMicrosecondType, UInt64Type,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use sqlx::{Executor, MySql, MySqlPool, QueryBuilder, query_builder::Separated};
use tablecopy_config::shared::MySqlConnectionConfig;
use tablecopy_mysql::db::{connect_to_database, quote_identifier};
use tablecopy_mysql::schema::arrow_type_to_mysql;
use tracing::{debug, info};

use crate::destination::Destination;
use crate::destination::text::to_string_array;
use crate::error::{ErrorKind, EtlError, EtlResult};
use crate::types::TableSnapshot;
use crate::{bail, etl_error};

/// Maximum number of placeholders MySQL accepts in one prepared statement.
const MAX_PLACEHOLDERS: usize = 65_535;

/// Replaces tables in a target MySQL database.
///
/// Each write drops the same-named table, recreates it with columns mapped from the snapshot's
/// Arrow types and inserts every row in multi-row `INSERT` statements inside one transaction.
/// No keys or constraints are created.
#[derive(Debug, Clone)]
pub struct MySqlDestination {
    pool: MySqlPool,
    insert_batch_size: usize,
}

impl MySqlDestination {
    pub fn new(pool: MySqlPool, insert_batch_size: usize) -> Self {
        Self {
            pool,
            insert_batch_size: insert_batch_size.max(1),
        }
    }

    /// Connects to the database named in `config`.
    pub async fn connect(
        config: &MySqlConnectionConfig,
        insert_batch_size: usize,
    ) -> EtlResult<Self> {
        let pool = connect_to_database(config).await.map_err(|err| {
            etl_error!(
                ErrorKind::DestinationConnectionFailed,
                "Connecting to the target database failed",
                format!("{}:{}/{}", config.host, config.port, config.name),
                source: err
            )
        })?;

        Ok(Self::new(pool, insert_batch_size))
    }

    /// Rows per `INSERT`, bounded so a statement never exceeds the placeholder limit.
    fn rows_per_statement(&self, num_columns: usize) -> usize {
        let by_placeholders = (MAX_PLACEHOLDERS / num_columns.max(1)).max(1);
        self.insert_batch_size.min(by_placeholders)
    }

    async fn recreate_table(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        let table = quote_identifier(snapshot.name());

        self.pool
            .execute(format!("DROP TABLE IF EXISTS {table}").as_str())
            .await
            .map_err(|err| query_error("Dropping target table failed", snapshot.name(), err))?;

        self.pool
            .execute(create_table_statement(snapshot).as_str())
            .await
            .map_err(|err| query_error("Creating target table failed", snapshot.name(), err))?;

        debug!(table = snapshot.name(), "recreated target table");

        Ok(())
    }

    async fn insert_rows(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        let columns = snapshot
            .batch()
            .columns()
            .iter()
            .map(BindColumn::try_from_array)
            .collect::<EtlResult<Vec<_>>>()?;

        let insert_prefix = format!(
            "INSERT INTO {} ({}) ",
            quote_identifier(snapshot.name()),
            snapshot
                .column_names()
                .iter()
                .map(|name| quote_identifier(name))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut transaction = self.pool.begin().await.map_err(|err| {
            etl_error!(
                ErrorKind::DestinationConnectionFailed,
                "Starting target transaction failed",
                snapshot.name(),
                source: err
            )
        })?;

        let chunk_size = self.rows_per_statement(columns.len());
        let num_rows = snapshot.num_rows();
        let mut start = 0;

        while start < num_rows {
            let end = (start + chunk_size).min(num_rows);

            let mut builder = QueryBuilder::<MySql>::new(&insert_prefix);
            builder.push_values(start..end, |mut row, index| {
                for column in &columns {
                    column.push_bind(&mut row, index);
                }
            });

            builder
                .build()
                .execute(&mut *transaction)
                .await
                .map_err(|err| {
                    query_error("Inserting rows into target table failed", snapshot.name(), err)
                })?;

            start = end;
        }

        transaction.commit().await.map_err(|err| {
            query_error("Committing target transaction failed", snapshot.name(), err)
        })?;

        Ok(())
    }
}

#[async_trait]
impl Destination for MySqlDestination {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn write_table(&self, snapshot: &TableSnapshot) -> EtlResult<()> {
        if snapshot.num_columns() == 0 {
            bail!(
                ErrorKind::InvalidData,
                "Cannot create a table without columns",
                snapshot.name()
            );
        }

        self.recreate_table(snapshot).await?;
        self.insert_rows(snapshot).await?;

        info!(
            table = snapshot.name(),
            rows = snapshot.num_rows(),
            "replaced target table"
        );

        Ok(())
    }
}

fn query_error(description: &'static str, table: &str, err: sqlx::Error) -> EtlError {
    let kind = match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::PoolTimedOut => ErrorKind::DestinationConnectionFailed,
        _ => ErrorKind::DestinationQueryFailed,
    };

    etl_error!(kind, description, table, source: err)
}

/// `CREATE TABLE` with every column nullable, in snapshot order.
fn create_table_statement(snapshot: &TableSnapshot) -> String {
    let schema = snapshot.schema();
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            format!(
                "{} {} NULL",
                quote_identifier(field.name()),
                arrow_type_to_mysql(field.data_type())
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "CREATE TABLE {} ({columns})",
        quote_identifier(snapshot.name())
    )
}

/// A snapshot column normalized to a type that can be bound as a MySQL parameter.
///
/// Normalization mirrors [`arrow_type_to_mysql`]: integers widen to 64 bits, temporal values
/// move to microsecond precision, and types without a native column become text.
enum BindColumn {
    Boolean(BooleanArray),
    Int64(Int64Array),
    UInt64(UInt64Array),
    Float32(Float32Array),
    Float64(Float64Array),
    Date32(Date32Array),
    Timestamp(TimestampMicrosecondArray),
    Time64(Time64MicrosecondArray),
    Binary(BinaryArray),
    Utf8(StringArray),
}

impl BindColumn {
    fn try_from_array(array: &ArrayRef) -> EtlResult<Self> {
        let column = match array.data_type() {
            DataType::Boolean => array.as_boolean_opt().cloned().map(BindColumn::Boolean),
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                cast(array, &DataType::Int64)?
                    .as_primitive_opt::<Int64Type>()
                    .cloned()
                    .map(BindColumn::Int64)
            }
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
                cast(array, &DataType::UInt64)?
                    .as_primitive_opt::<UInt64Type>()
                    .cloned()
                    .map(BindColumn::UInt64)
            }
            DataType::Float16 | DataType::Float32 => cast(array, &DataType::Float32)?
                .as_primitive_opt::<Float32Type>()
                .cloned()
                .map(BindColumn::Float32),
            DataType::Float64 => array
                .as_primitive_opt::<Float64Type>()
                .cloned()
                .map(BindColumn::Float64),
            DataType::Date32 | DataType::Date64 => cast(array, &DataType::Date32)?
                .as_primitive_opt::<Date32Type>()
                .cloned()
                .map(BindColumn::Date32),
            DataType::Timestamp(_, _) => {
                cast(array, &DataType::Timestamp(TimeUnit::Microsecond, None))?
                    .as_primitive_opt::<TimestampMicrosecondType>()
                    .cloned()
                    .map(BindColumn::Timestamp)
            }
            DataType::Time32(_) | DataType::Time64(_) => {
                cast(array, &DataType::Time64(TimeUnit::Microsecond))?
                    .as_primitive_opt::<Time64MicrosecondType>()
                    .cloned()
                    .map(BindColumn::Time64)
            }
            DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => {
                cast(array, &DataType::Binary)?
                    .as_binary_opt::<i32>()
                    .cloned()
                    .map(BindColumn::Binary)
            }
            DataType::Utf8 => array.as_string_opt::<i32>().cloned().map(BindColumn::Utf8),
            _ => Some(BindColumn::Utf8(to_string_array(array.as_ref())?)),
        };

        column.ok_or_else(|| {
            etl_error!(
                ErrorKind::ConversionError,
                "Column cannot be bound as a MySQL parameter",
                array.data_type()
            )
        })
    }

    fn push_bind(&self, row: &mut Separated<'_, '_, MySql, &'static str>, index: usize) {
        match self {
            BindColumn::Boolean(array) => {
                row.push_bind(array.is_valid(index).then(|| array.value(index)));
            }
            BindColumn::Int64(array) => {
                row.push_bind(array.is_valid(index).then(|| array.value(index)));
            }
            BindColumn::UInt64(array) => {
                row.push_bind(array.is_valid(index).then(|| array.value(index)));
            }
            BindColumn::Float32(array) => {
                row.push_bind(array.is_valid(index).then(|| array.value(index)));
            }
            BindColumn::Float64(array) => {
                row.push_bind(array.is_valid(index).then(|| array.value(index)));
            }
            BindColumn::Date32(array) => {
                let value = array
                    .is_valid(index)
                    .then(|| date_from_days(array.value(index)))
                    .flatten();
                row.push_bind(value);
            }
            BindColumn::Timestamp(array) => {
                let value = array
                    .is_valid(index)
                    .then(|| datetime_from_micros(array.value(index)))
                    .flatten();
                row.push_bind(value);
            }
            BindColumn::Time64(array) => {
                let value = array
                    .is_valid(index)
                    .then(|| time_from_micros(array.value(index)))
                    .flatten();
                row.push_bind(value);
            }
            BindColumn::Binary(array) => {
                row.push_bind(array.is_valid(index).then(|| array.value(index).to_vec()));
            }
            BindColumn::Utf8(array) => {
                row.push_bind(array.is_valid(index).then(|| array.value(index).to_string()));
            }
        }
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    DateTime::UNIX_EPOCH
        .date_naive()
        .checked_add_signed(TimeDelta::days(i64::from(days)))
}

fn datetime_from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|value| value.naive_utc())
}

fn time_from_micros(micros: i64) -> Option<NaiveTime> {
    let seconds = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
}
