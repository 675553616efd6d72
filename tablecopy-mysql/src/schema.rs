use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use sqlx::{Column, TypeInfo, mysql::MySqlColumn};

/// Timezone attached to Arrow timestamps read from `TIMESTAMP` columns.
pub const TIMESTAMP_TIMEZONE: &str = "+00:00";

/// How a MySQL column is decoded and which Arrow type it becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    /// Signed integers of any width and `YEAR`.
    Int,
    /// Unsigned integers up to `INT UNSIGNED`, which fit in `Int64`.
    UnsignedInt,
    UnsignedBigInt,
    Float,
    Double,
    Date,
    DateTime,
    Timestamp,
    Time,
    Binary,
    /// Character data, `DECIMAL`, `ENUM`, `SET`, `JSON` and anything unrecognized.
    Text,
}

impl ColumnKind {
    /// Classifies a sqlx type name such as `INT UNSIGNED` or `VARCHAR`.
    pub fn from_type_name(name: &str) -> ColumnKind {
        let name = name.trim().to_ascii_uppercase();
        let unsigned = name.ends_with(" UNSIGNED");
        let base = name.split([' ', '(']).next().unwrap_or_default();

        match base {
            "BOOLEAN" | "BOOL" => ColumnKind::Boolean,
            "BIGINT" if unsigned => ColumnKind::UnsignedBigInt,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" if unsigned => {
                ColumnKind::UnsignedInt
            }
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => ColumnKind::Int,
            // YEAR travels as an unsigned short on the wire.
            "YEAR" => ColumnKind::UnsignedInt,
            "FLOAT" => ColumnKind::Float,
            "DOUBLE" | "REAL" => ColumnKind::Double,
            "DATE" => ColumnKind::Date,
            "DATETIME" => ColumnKind::DateTime,
            "TIMESTAMP" => ColumnKind::Timestamp,
            "TIME" => ColumnKind::Time,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
            | "GEOMETRY" => ColumnKind::Binary,
            _ => ColumnKind::Text,
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Boolean => DataType::Boolean,
            ColumnKind::Int | ColumnKind::UnsignedInt => DataType::Int64,
            ColumnKind::UnsignedBigInt => DataType::UInt64,
            ColumnKind::Float => DataType::Float32,
            ColumnKind::Double => DataType::Float64,
            ColumnKind::Date => DataType::Date32,
            ColumnKind::DateTime => DataType::Timestamp(TimeUnit::Microsecond, None),
            ColumnKind::Timestamp => {
                DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TIMEZONE.into()))
            }
            ColumnKind::Time => DataType::Time64(TimeUnit::Microsecond),
            ColumnKind::Binary => DataType::Binary,
            ColumnKind::Text => DataType::Utf8,
        }
    }
}

/// Maps an Arrow type to the column type used when creating a table in the target database.
pub fn arrow_type_to_mysql(data_type: &DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "BOOLEAN",
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => "BIGINT",
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            "BIGINT UNSIGNED"
        }
        DataType::Float16 | DataType::Float32 => "FLOAT",
        DataType::Float64 => "DOUBLE",
        DataType::Date32 | DataType::Date64 => "DATE",
        DataType::Timestamp(_, _) => "DATETIME(6)",
        DataType::Time32(_) | DataType::Time64(_) => "TIME(6)",
        DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => "LONGBLOB",
        _ => "LONGTEXT",
    }
}

/// Column kinds and the nullable Arrow schema for a result set's columns.
pub fn schema_from_columns(columns: &[MySqlColumn]) -> (Vec<ColumnKind>, Schema) {
    let kinds: Vec<ColumnKind> = columns
        .iter()
        .map(|column| ColumnKind::from_type_name(column.type_info().name()))
        .collect();

    let fields: Vec<Field> = columns
        .iter()
        .zip(&kinds)
        .map(|(column, kind)| Field::new(column.name(), kind.data_type(), true))
        .collect();

    (kinds, Schema::new(fields))
}
