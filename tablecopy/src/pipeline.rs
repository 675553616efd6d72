//! Sequential read-then-write driver over a [`Source`] and a [`Destination`].

use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{error, info};

use crate::destination::Destination;
use crate::error::EtlResult;
use crate::metrics::{
    DESTINATION_LABEL, TABLE_NAME_LABEL, TABLECOPY_ROWS_WRITTEN_TOTAL,
    TABLECOPY_TABLE_DURATION_SECONDS, TABLECOPY_TABLES_WRITTEN_TOTAL,
};
use crate::source::Source;
use crate::types::{TablePlan, TableRequest};

/// Row and column counts of one table written by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
}

/// Summary of a completed pipeline run, one entry per table in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub tables: Vec<TableReport>,
}

impl PipelineReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|table| table.rows).sum()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.table.as_str()).collect()
    }
}

/// Moves tables from a source to a destination, one table at a time.
///
/// Each table is read once into memory and written once to the destination before the next
/// table is read. The first read or write error aborts the run; tables already written are
/// left in place.
#[derive(Debug, Clone)]
pub struct Pipeline<S, D> {
    source: S,
    destination: D,
}

impl<S, D> Pipeline<S, D>
where
    S: Source,
    D: Destination,
{
    pub fn new(source: S, destination: D) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub async fn run(&self, plan: TablePlan) -> EtlResult<PipelineReport> {
        let catalog = if plan.needs_catalog() {
            Some(self.source.list_tables().await?)
        } else {
            None
        };
        let requests = plan.into_requests(catalog);

        info!(
            destination = self.destination.name(),
            table_count = requests.len(),
            "starting pipeline run"
        );

        let mut report = PipelineReport::default();
        for request in &requests {
            match self.copy_table(request).await {
                Ok(table_report) => report.tables.push(table_report),
                Err(err) => {
                    error!(
                        table = %request.table,
                        destination = self.destination.name(),
                        %err,
                        "pipeline run aborted"
                    );
                    return Err(err);
                }
            }
        }

        info!(
            destination = self.destination.name(),
            table_count = report.tables.len(),
            total_rows = report.total_rows(),
            "pipeline run completed"
        );

        Ok(report)
    }

    async fn copy_table(&self, request: &TableRequest) -> EtlResult<TableReport> {
        let start = Instant::now();

        let snapshot = self
            .source
            .read_table(&request.table, request.columns.as_deref())
            .await?;

        info!(
            table = snapshot.name(),
            rows = snapshot.num_rows(),
            columns = snapshot.num_columns(),
            "read table"
        );

        self.destination.write_table(&snapshot).await?;

        let destination = self.destination.name();
        counter!(
            TABLECOPY_TABLES_WRITTEN_TOTAL,
            TABLE_NAME_LABEL => request.table.clone(),
            DESTINATION_LABEL => destination,
        )
        .increment(1);
        counter!(
            TABLECOPY_ROWS_WRITTEN_TOTAL,
            TABLE_NAME_LABEL => request.table.clone(),
            DESTINATION_LABEL => destination,
        )
        .increment(snapshot.num_rows() as u64);
        histogram!(
            TABLECOPY_TABLE_DURATION_SECONDS,
            TABLE_NAME_LABEL => request.table.clone(),
            DESTINATION_LABEL => destination,
        )
        .record(start.elapsed().as_secs_f64());

        Ok(TableReport {
            table: snapshot.name().to_string(),
            rows: snapshot.num_rows(),
            columns: snapshot.num_columns(),
        })
    }
}
