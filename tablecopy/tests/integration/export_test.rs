use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Int64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tablecopy::destination::Destination;
use tablecopy::destination::csv::CsvDestination;
use tablecopy::steps;
use tablecopy::test_utils::source::MemorySource;
use tablecopy::test_utils::table::{
    ACTOR_FIRST_NAMES, STAFF_COLUMNS, actor_batch, actor_snapshot, customer_batch,
    full_actor_batch, staff_batch,
};
use tablecopy::types::TableSnapshot;
use tablecopy_config::shared::{ExportConfig, ExportFormat};
use tablecopy_telemetry::tracing::init_test_tracing;

fn export_config(output_dir: &Path) -> ExportConfig {
    ExportConfig {
        output_dir: output_dir.to_path_buf(),
        ..ExportConfig::default()
    }
}

fn read_parquet(path: &Path) -> Vec<RecordBatch> {
    let file = File::open(path).unwrap();
    ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn read_avro(path: &Path) -> Vec<RecordBatch> {
    let file = BufReader::new(File::open(path).unwrap());
    arrow_avro::reader::ReaderBuilder::new()
        .build(file)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

fn string_values(batches: &[RecordBatch], column: &str) -> Vec<Option<String>> {
    batches
        .iter()
        .flat_map(|batch| {
            let index = batch.schema().index_of(column).unwrap();
            let values = batch.column(index).as_string::<i32>().clone();
            (0..values.len())
                .map(|row| values.is_valid(row).then(|| values.value(row).to_string()))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[tokio::test]
async fn export_writes_every_format() {
    init_test_tracing();

    let output = tempfile::tempdir().unwrap();
    let source = MemorySource::new().with_table("actor", actor_batch()).await;

    let report = steps::export(source, &export_config(output.path()))
        .await
        .unwrap();
    assert_eq!(report.total_rows(), 5);

    let csv = fs::read_to_string(output.path().join("csv/actor.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], "actor_id,first_name");
    assert_eq!(lines[1], "1,PENELOPE");

    let parquet = read_parquet(&output.path().join("parquet/actor.parquet"));
    let rows: usize = parquet.iter().map(RecordBatch::num_rows).sum();
    assert_eq!(rows, 5);
    assert_eq!(parquet[0].schema().field(0).data_type(), &DataType::Int64);
    let ids: Vec<i64> = parquet
        .iter()
        .flat_map(|batch| batch.column(0).as_primitive::<Int64Type>().values().to_vec())
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let avro = read_avro(&output.path().join("avro/actor.avro"));
    let ids = string_values(&avro, "actor_id");
    let expected: Vec<Option<String>> = (1..=5).map(|id| Some(id.to_string())).collect();
    assert_eq!(ids, expected);

    let names = string_values(&avro, "first_name");
    let expected: Vec<Option<String>> = ACTOR_FIRST_NAMES
        .iter()
        .map(|name| Some(name.to_string()))
        .collect();
    assert_eq!(names, expected);
}

#[tokio::test]
async fn export_only_enabled_formats_for_listed_tables() {
    init_test_tracing();

    let output = tempfile::tempdir().unwrap();
    let source = MemorySource::new()
        .with_table("actor", actor_batch())
        .await
        .with_table("customer", customer_batch())
        .await;
    let config = ExportConfig {
        formats: vec![ExportFormat::Csv],
        tables: vec!["customer".to_string()],
        ..export_config(output.path())
    };

    steps::export(source.clone(), &config).await.unwrap();

    assert_eq!(source.reads().await, vec!["customer"]);
    assert!(output.path().join("csv/customer.csv").is_file());
    assert!(!output.path().join("csv/actor.csv").exists());
    assert!(!output.path().join("parquet").exists());
    assert!(!output.path().join("avro").exists());

    // Missing emails are written as empty fields.
    let csv = fs::read_to_string(output.path().join("csv/customer.csv")).unwrap();
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        vec![
            "customer_id,email",
            "1,MARY.SMITH@sakilacustomer.org",
            "2,"
        ]
    );
}

#[tokio::test]
async fn export_overwrites_previous_files() {
    init_test_tracing();

    let output = tempfile::tempdir().unwrap();
    let config = export_config(output.path());

    let first = MemorySource::new().with_table("actor", actor_batch()).await;
    steps::export(first, &config).await.unwrap();

    let smaller = actor_batch().slice(0, 2);
    let second = MemorySource::new().with_table("actor", smaller).await;
    steps::export(second, &config).await.unwrap();

    let csv = fs::read_to_string(output.path().join("csv/actor.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);

    let parquet = read_parquet(&output.path().join("parquet/actor.parquet"));
    assert_eq!(parquet.iter().map(RecordBatch::num_rows).sum::<usize>(), 2);

    let avro = read_avro(&output.path().join("avro/actor.avro"));
    assert_eq!(avro.iter().map(RecordBatch::num_rows).sum::<usize>(), 2);

    // No temporary files are left next to the outputs.
    for format in ExportFormat::ALL {
        let entries = fs::read_dir(config.format_dir(format)).unwrap().count();
        assert_eq!(entries, 1);
    }
}

#[tokio::test]
async fn csv_header_follows_snapshot_column_order() {
    init_test_tracing();

    let output = tempfile::tempdir().unwrap();
    let snapshot = TableSnapshot::new("actor", full_actor_batch());
    let reordered = TableSnapshot::new(
        "actor",
        full_actor_batch().project(&[3, 1, 0]).unwrap(),
    );

    let destination = CsvDestination::new(output.path());
    destination.write_table(&snapshot).await.unwrap();
    let csv = fs::read_to_string(destination.file_path("actor")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "actor_id,first_name,last_name,last_update");
    assert_eq!(lines[1], "1,PENELOPE,GUINESS,2006-02-15 04:34:33");

    destination.write_table(&reordered).await.unwrap();
    let csv = fs::read_to_string(destination.file_path("actor")).unwrap();
    assert_eq!(csv.lines().next(), Some("last_update,first_name,actor_id"));
}

#[tokio::test]
async fn avro_values_are_text_of_source_values() {
    init_test_tracing();

    let output = tempfile::tempdir().unwrap();
    let config = export_config(output.path());
    let source = MemorySource::new()
        .with_table("actor", full_actor_batch())
        .await;

    steps::export(source, &config).await.unwrap();

    let avro = read_avro(&config.format_dir(ExportFormat::Avro).join("actor.avro"));
    for field in avro[0].schema().fields() {
        assert_eq!(field.data_type(), &DataType::Utf8);
    }
    assert_eq!(
        string_values(&avro, "last_update")[0].as_deref(),
        Some("2006-02-15 04:34:33")
    );
}

#[tokio::test]
async fn empty_table_is_exported_with_header_only() {
    init_test_tracing();

    let output = tempfile::tempdir().unwrap();
    let destination = CsvDestination::new(output.path());
    let empty = TableSnapshot::new("actor", actor_snapshot().batch().slice(0, 0));

    destination.write_table(&empty).await.unwrap();

    let csv = fs::read_to_string(destination.file_path("actor")).unwrap();
    assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["actor_id,first_name"]);
}

#[tokio::test]
async fn export_handles_every_source_column_type() {
    init_test_tracing();

    let output = tempfile::tempdir().unwrap();
    let config = export_config(output.path());
    let source = MemorySource::new().with_table("staff", staff_batch()).await;

    let report = steps::export(source, &config).await.unwrap();
    assert_eq!(report.total_rows(), 2);

    let header = STAFF_COLUMNS.map(|(name, _)| name).join(",");
    let first_row = [
        "1",
        "true",
        "18446744073709551615",
        "2.5",
        "5.99",
        "2006-02-15",
        "2005-05-24 22:53:30",
        "2006-02-15 04:34:33",
        "01:30:00.250",
        "8950",
        "Mike.Hillyer@sakilastaff.com",
    ];

    let csv = fs::read_to_string(config.format_dir(ExportFormat::Csv).join("staff.csv")).unwrap();
    assert_eq!(
        csv.lines().collect::<Vec<_>>(),
        vec![header, first_row.join(","), "2,,,,,,,,,,".to_string()]
    );

    // Parquet keeps the source types and values.
    let expected = staff_batch();
    let parquet = read_parquet(&config.format_dir(ExportFormat::Parquet).join("staff.parquet"));
    assert_eq!(parquet.len(), 1);
    for (written, source) in parquet[0].schema().fields().iter().zip(expected.schema().fields()) {
        assert_eq!(written.name(), source.name());
        assert_eq!(written.data_type(), source.data_type(), "{}", source.name());
    }
    assert_eq!(parquet[0].columns(), expected.columns());

    // Avro carries the CSV text, with nulls kept as nulls.
    let avro = read_avro(&config.format_dir(ExportFormat::Avro).join("staff.avro"));
    for ((name, _), value) in STAFF_COLUMNS.iter().zip(first_row) {
        let second = (*name == "staff_id").then(|| "2".to_string());
        assert_eq!(
            string_values(&avro, name),
            vec![Some(value.to_string()), second],
            "{name}"
        );
    }
}
