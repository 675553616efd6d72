use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::{WriterProperties, WriterVersion};

use crate::destination::file::{FileDestination, FileFormat};
use crate::error::EtlResult;
use crate::types::TableSnapshot;

/// Maximum rows per Parquet row group.
const MAX_ROW_GROUP_SIZE: usize = 100_000;

/// Parquet with the snapshot's own Arrow types and Snappy compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetFormat;

fn writer_properties() -> WriterProperties {
    WriterProperties::builder()
        .set_writer_version(WriterVersion::PARQUET_1_0)
        .set_compression(Compression::SNAPPY)
        .set_max_row_group_size(MAX_ROW_GROUP_SIZE)
        .build()
}

impl FileFormat for ParquetFormat {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn extension(&self) -> &'static str {
        "parquet"
    }

    fn encode(&self, snapshot: &TableSnapshot, out: &mut BufWriter<File>) -> EtlResult<()> {
        let mut writer = ArrowWriter::try_new(out, snapshot.schema(), Some(writer_properties()))?;
        writer.write(snapshot.batch())?;
        writer.close()?;

        Ok(())
    }
}

/// Writes `<directory>/<table>.parquet`.
pub type ParquetDestination = FileDestination<ParquetFormat>;

impl FileDestination<ParquetFormat> {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        FileDestination::with_format(directory, ParquetFormat)
    }
}
