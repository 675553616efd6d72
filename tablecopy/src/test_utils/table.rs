use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int64Array,
    StringArray, Time64MicrosecondArray, TimestampMicrosecondArray, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use tablecopy_mysql::schema::{ColumnKind, TIMESTAMP_TIMEZONE};

use crate::types::TableSnapshot;

pub const ACTOR_FIRST_NAMES: [&str; 5] = ["PENELOPE", "NICK", "ED", "JENNIFER", "JOHNNY"];

pub const ACTOR_LAST_NAMES: [&str; 5] = ["GUINESS", "WAHLBERG", "CHASE", "DAVIS", "LOLLOBRIGIDA"];

/// `2006-02-15 04:34:33` in microseconds since the epoch.
pub const ACTOR_LAST_UPDATE_MICROS: i64 = 1_139_978_073_000_000;

/// `actor(actor_id, first_name)` with ids 1 to 5.
pub fn actor_batch() -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("actor_id", DataType::Int64, true),
        Field::new("first_name", DataType::Utf8, true),
    ]);

    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from_iter_values(1..=5)) as ArrayRef,
            Arc::new(StringArray::from(ACTOR_FIRST_NAMES.to_vec())),
        ],
    )
    .expect("actor batch is valid")
}

/// `actor` with `last_name` and a `last_update` timestamp added after `first_name`.
pub fn full_actor_batch() -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("actor_id", DataType::Int64, true),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new(
            "last_update",
            DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TIMEZONE.into())),
            true,
        ),
    ]);

    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from_iter_values(1..=5)) as ArrayRef,
            Arc::new(StringArray::from(ACTOR_FIRST_NAMES.to_vec())),
            Arc::new(StringArray::from(ACTOR_LAST_NAMES.to_vec())),
            Arc::new(
                TimestampMicrosecondArray::from(vec![ACTOR_LAST_UPDATE_MICROS; 5])
                    .with_timezone(TIMESTAMP_TIMEZONE),
            ),
        ],
    )
    .expect("full actor batch is valid")
}

/// `customer(customer_id, email)` with two rows, the second without an email.
pub fn customer_batch() -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("customer_id", DataType::Int64, true),
        Field::new("email", DataType::Utf8, true),
    ]);

    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
            Arc::new(StringArray::from(vec![
                Some("MARY.SMITH@sakilacustomer.org"),
                None,
            ])),
        ],
    )
    .expect("customer batch is valid")
}

/// `2005-05-24 22:53:30` in microseconds since the epoch.
pub const STAFF_RENTAL_DATE_MICROS: i64 = 1_116_975_210_000_000;

/// Columns of [`staff_batch`] with the MySQL type each one is read from.
pub const STAFF_COLUMNS: [(&str, ColumnKind); 11] = [
    ("staff_id", ColumnKind::Int),
    ("active", ColumnKind::Boolean),
    ("store_id", ColumnKind::UnsignedBigInt),
    ("rental_rate", ColumnKind::Float),
    ("amount", ColumnKind::Double),
    ("hired", ColumnKind::Date),
    ("rental_date", ColumnKind::DateTime),
    ("last_update", ColumnKind::Timestamp),
    ("length", ColumnKind::Time),
    ("picture", ColumnKind::Binary),
    ("email", ColumnKind::Text),
];

/// One column of every type the MySQL reader produces, typed exactly as the reader types it.
///
/// The first row holds a value in every column, the second row is null apart from `staff_id`.
pub fn staff_batch() -> RecordBatch {
    let fields: Vec<Field> = STAFF_COLUMNS
        .iter()
        .map(|(name, kind)| Field::new(*name, kind.data_type(), true))
        .collect();

    RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        vec![
            Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
            Arc::new(BooleanArray::from(vec![Some(true), None])),
            Arc::new(UInt64Array::from(vec![Some(u64::MAX), None])),
            Arc::new(Float32Array::from(vec![Some(2.5), None])),
            Arc::new(Float64Array::from(vec![Some(5.99), None])),
            // 2006-02-15
            Arc::new(Date32Array::from(vec![Some(13_194), None])),
            Arc::new(TimestampMicrosecondArray::from(vec![
                Some(STAFF_RENTAL_DATE_MICROS),
                None,
            ])),
            Arc::new(
                TimestampMicrosecondArray::from(vec![Some(ACTOR_LAST_UPDATE_MICROS), None])
                    .with_timezone(TIMESTAMP_TIMEZONE),
            ),
            // 01:30:00.250
            Arc::new(Time64MicrosecondArray::from(vec![Some(5_400_250_000), None])),
            Arc::new(BinaryArray::from(vec![Some(&[0x89_u8, 0x50][..]), None])),
            Arc::new(StringArray::from(vec![
                Some("Mike.Hillyer@sakilastaff.com"),
                None,
            ])),
        ],
    )
    .expect("staff batch is valid")
}

pub fn actor_snapshot() -> TableSnapshot {
    TableSnapshot::new("actor", actor_batch())
}
