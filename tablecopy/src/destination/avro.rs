use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow_avro::schema::AVRO_NAME_METADATA_KEY;
use arrow_avro::writer::WriterBuilder;
use arrow_avro::writer::format::AvroOcfFormat;

use crate::bail;
use crate::destination::file::{FileDestination, FileFormat};
use crate::destination::text::to_string_array;
use crate::error::{ErrorKind, EtlResult};
use crate::types::TableSnapshot;

/// Avro object container file in which every field is a string.
///
/// Values are rendered the same way as in CSV output, with binary as hex. Numeric and temporal
/// types are not preserved. The record is named after the table and nullable columns become
/// `["null", "string"]` unions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvroFormat;

impl FileFormat for AvroFormat {
    fn name(&self) -> &'static str {
        "avro"
    }

    fn extension(&self) -> &'static str {
        "avro"
    }

    fn encode(&self, snapshot: &TableSnapshot, out: &mut BufWriter<File>) -> EtlResult<()> {
        let batch = string_batch(snapshot)?;

        let mut writer =
            WriterBuilder::new(batch.schema().as_ref().clone()).build::<_, AvroOcfFormat>(out)?;
        writer.write(&batch)?;
        writer.finish()?;

        Ok(())
    }
}

/// Writes `<directory>/<table>.avro`.
pub type AvroDestination = FileDestination<AvroFormat>;

impl FileDestination<AvroFormat> {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        FileDestination::with_format(directory, AvroFormat)
    }
}

/// Converts every column to nullable-preserving strings under Avro-safe names.
///
/// The returned schema carries the table name as the Avro record name.
fn string_batch(snapshot: &TableSnapshot) -> EtlResult<RecordBatch> {
    let source_schema = snapshot.schema();
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(source_schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(source_schema.fields().len());

    for (field, column) in source_schema.fields().iter().zip(snapshot.batch().columns()) {
        let name = avro_name(field.name());
        if !seen.insert(name.clone()) {
            bail!(
                ErrorKind::InvalidData,
                "Column names collide after conversion to Avro names",
                format!("table `{}`, column `{}`", snapshot.name(), field.name())
            );
        }

        fields.push(Field::new(name, DataType::Utf8, field.is_nullable()));
        columns.push(Arc::new(to_string_array(column.as_ref())?));
    }

    let metadata = HashMap::from([(
        AVRO_NAME_METADATA_KEY.to_string(),
        avro_name(snapshot.name()),
    )]);
    let schema = Arc::new(Schema::new_with_metadata(fields, metadata));

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Maps an identifier to an Avro name: `[A-Za-z_][A-Za-z0-9_]*`.
fn avro_name(identifier: &str) -> String {
    let mut name: String = identifier
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }

    name
}

#[cfg(test)]
mod tests {
    use std::io::BufReader;

    use arrow::array::{Array, Int64Array, StringArray};
    use arrow_avro::reader::ReaderBuilder;
    use arrow_avro::schema::SCHEMA_METADATA_KEY;
    use serde_json::json;

    use super::*;
    use crate::test_utils::table::actor_snapshot;

    #[test]
    fn names_are_made_avro_safe() {
        assert_eq!(avro_name("actor"), "actor");
        assert_eq!(avro_name("film-text"), "film_text");
        assert_eq!(avro_name("2024 sales"), "_2024_sales");
        assert_eq!(avro_name(""), "_");
    }

    fn written_header_schema(snapshot: &TableSnapshot) -> serde_json::Value {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.avro");
        let mut out = BufWriter::new(File::create(&path).unwrap());
        AvroFormat.encode(snapshot, &mut out).unwrap();
        drop(out);

        let reader = ReaderBuilder::new()
            .build(BufReader::new(File::open(&path).unwrap()))
            .unwrap();
        let schema_json = reader.avro_header().get(SCHEMA_METADATA_KEY).unwrap();

        serde_json::from_slice(schema_json).unwrap()
    }

    #[test]
    fn written_record_is_named_after_table() {
        let schema = written_header_schema(&actor_snapshot());

        assert_eq!(schema["type"], "record");
        assert_eq!(schema["name"], "actor");
    }

    #[test]
    fn written_fields_are_nullable_strings() {
        let schema = Schema::new(vec![
            Field::new("actor_id", DataType::Int64, false),
            Field::new("first-name", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(StringArray::from(vec![Some("PENELOPE")])),
            ],
        )
        .unwrap();

        let schema = written_header_schema(&TableSnapshot::new("film text", batch));

        assert_eq!(schema["name"], "film_text");
        assert_eq!(
            schema["fields"],
            json!([
                { "name": "actor_id", "type": "string" },
                { "name": "first_name", "type": ["null", "string"] },
            ])
        );
    }

    #[test]
    fn values_become_strings() {
        let schema = Schema::new(vec![
            Field::new("actor_id", DataType::Int64, true),
            Field::new("first_name", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![Some(1), None])),
                Arc::new(StringArray::from(vec![Some("PENELOPE"), Some("NICK")])),
            ],
        )
        .unwrap();

        let converted = string_batch(&TableSnapshot::new("actor", batch)).unwrap();
        let ids = converted
            .column(0)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();

        assert_eq!(ids.value(0), "1");
        assert!(ids.is_null(1));
        assert_eq!(
            converted.schema().metadata().get(AVRO_NAME_METADATA_KEY),
            Some(&"actor".to_string())
        );
    }

    #[test]
    fn colliding_names_are_rejected() {
        let schema = Schema::new(vec![
            Field::new("a-b", DataType::Int64, true),
            Field::new("a_b", DataType::Int64, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1])),
                Arc::new(Int64Array::from(vec![2])),
            ],
        )
        .unwrap();

        let err = string_batch(&TableSnapshot::new("t", batch)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
