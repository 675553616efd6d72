use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use arrow::csv::WriterBuilder;

use crate::destination::file::{FileDestination, FileFormat};
use crate::destination::text::{DATE_FORMAT, TIME_FORMAT, TIMESTAMP_FORMAT};
use crate::error::EtlResult;
use crate::types::TableSnapshot;

/// Comma-separated text with a header line of column names.
///
/// Nulls are written as empty fields and no row index column is added.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormat;

impl FileFormat for CsvFormat {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn encode(&self, snapshot: &TableSnapshot, out: &mut BufWriter<File>) -> EtlResult<()> {
        let mut writer = WriterBuilder::new()
            .with_header(true)
            .with_delimiter(b',')
            .with_null(String::new())
            .with_date_format(DATE_FORMAT.to_string())
            .with_datetime_format(TIMESTAMP_FORMAT.to_string())
            .with_timestamp_format(TIMESTAMP_FORMAT.to_string())
            .with_timestamp_tz_format(TIMESTAMP_FORMAT.to_string())
            .with_time_format(TIME_FORMAT.to_string())
            .build(out);

        writer.write(snapshot.batch())?;

        Ok(())
    }
}

/// Writes `<directory>/<table>.csv`.
pub type CsvDestination = FileDestination<CsvFormat>;

impl FileDestination<CsvFormat> {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        FileDestination::with_format(directory, CsvFormat)
    }
}
