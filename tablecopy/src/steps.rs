//! The export, copy and transfer operations built on [`Pipeline`].

use std::fs;
use std::sync::Arc;

use tablecopy_config::shared::{ExportConfig, ExportFormat, TableColumns};
use tracing::{info, warn};

use crate::destination::avro::AvroDestination;
use crate::destination::csv::CsvDestination;
use crate::destination::parquet::ParquetDestination;
use crate::destination::{Destination, FanoutDestination};
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::pipeline::{Pipeline, PipelineReport};
use crate::source::Source;
use crate::types::TablePlan;

/// Builds the file destination for one export format, writing under `config.format_dir`.
pub fn file_destination(config: &ExportConfig, format: ExportFormat) -> Arc<dyn Destination> {
    let directory = config.format_dir(format);

    match format {
        ExportFormat::Csv => Arc::new(CsvDestination::new(directory)),
        ExportFormat::Parquet => Arc::new(ParquetDestination::new(directory)),
        ExportFormat::Avro => Arc::new(AvroDestination::new(directory)),
    }
}

/// Creates the output directory of every enabled format and a fan-out over their destinations.
pub fn export_destination(config: &ExportConfig) -> EtlResult<FanoutDestination> {
    let formats = config.enabled_formats();
    let mut destinations = Vec::with_capacity(formats.len());

    for format in formats {
        let directory = config.format_dir(format);
        fs::create_dir_all(&directory).map_err(|err| {
            etl_error!(
                ErrorKind::DestinationIoError,
                "Creating export directory failed",
                directory.display(),
                source: err
            )
        })?;

        destinations.push(file_destination(config, format));
    }

    Ok(FanoutDestination::new(destinations))
}

/// Exports the tables listed in `config.tables`, or every table when the list is empty, to
/// each enabled file format.
pub async fn export<S: Source>(source: S, config: &ExportConfig) -> EtlResult<PipelineReport> {
    let destination = export_destination(config)?;
    let plan = TablePlan::tables_or_all(&config.tables);

    info!(
        output_dir = %config.output_dir.display(),
        formats = ?config.enabled_formats(),
        "exporting tables"
    );

    Pipeline::new(source, destination).run(plan).await
}

/// Replaces every source table in the destination with a full copy.
pub async fn copy<S, D>(source: S, destination: D) -> EtlResult<PipelineReport>
where
    S: Source,
    D: Destination,
{
    info!(destination = destination.name(), "copying all tables");

    Pipeline::new(source, destination).run(TablePlan::All).await
}

/// Replaces each selected table in the destination with only its selected columns.
///
/// Tables missing from `selection` are not touched.
pub async fn transfer<S, D>(
    source: S,
    destination: D,
    selection: &[TableColumns],
) -> EtlResult<PipelineReport>
where
    S: Source,
    D: Destination,
{
    if selection.is_empty() {
        warn!("column selection is empty, nothing to transfer");
        return Ok(PipelineReport::default());
    }

    info!(
        destination = destination.name(),
        table_count = selection.len(),
        "transferring selected columns"
    );

    Pipeline::new(source, destination)
        .run(TablePlan::Columns(selection.to_vec()))
        .await
}
