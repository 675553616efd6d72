//! Steps of a run, each connecting to its databases for the duration of one invocation.

use async_trait::async_trait;
use tablecopy::destination::mysql::MySqlDestination;
use tablecopy::error::EtlResult;
use tablecopy::pipeline::PipelineReport;
use tablecopy::scheduler::Step;
use tablecopy::source::mysql::MySqlSource;
use tablecopy::steps;
use tablecopy_config::shared::{
    ExportConfig, MySqlConnectionConfig, RunnerConfig, TableColumns,
};

/// Exports source tables to files.
pub struct ExportStep {
    source: MySqlConnectionConfig,
    export: ExportConfig,
}

impl ExportStep {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            source: config.source.clone(),
            export: config.export.clone(),
        }
    }

    /// Exports only `tables` instead of the configured list, when any are given.
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        if !tables.is_empty() {
            self.export.tables = tables;
        }

        self
    }
}

#[async_trait]
impl Step for ExportStep {
    fn name(&self) -> &'static str {
        "export"
    }

    async fn run(&self) -> EtlResult<PipelineReport> {
        let source = MySqlSource::connect(&self.source).await?;

        steps::export(source, &self.export).await
    }
}

/// Copies every source table to the target database.
pub struct CopyStep {
    source: MySqlConnectionConfig,
    target: MySqlConnectionConfig,
    insert_batch_size: usize,
}

impl CopyStep {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            source: config.source.clone(),
            target: config.target.clone(),
            insert_batch_size: config.copy.insert_batch_size,
        }
    }
}

#[async_trait]
impl Step for CopyStep {
    fn name(&self) -> &'static str {
        "copy"
    }

    async fn run(&self) -> EtlResult<PipelineReport> {
        let source = MySqlSource::connect(&self.source).await?;
        let destination = MySqlDestination::connect(&self.target, self.insert_batch_size).await?;

        steps::copy(source, destination).await
    }
}

/// Copies the selected columns of the selected tables to the target database.
pub struct TransferStep {
    source: MySqlConnectionConfig,
    target: MySqlConnectionConfig,
    insert_batch_size: usize,
    selection: Vec<TableColumns>,
}

impl TransferStep {
    pub fn new(config: &RunnerConfig) -> Self {
        Self {
            source: config.source.clone(),
            target: config.target.clone(),
            insert_batch_size: config.copy.insert_batch_size,
            selection: config.selection.clone(),
        }
    }
}

#[async_trait]
impl Step for TransferStep {
    fn name(&self) -> &'static str {
        "transfer"
    }

    async fn run(&self) -> EtlResult<PipelineReport> {
        let source = MySqlSource::connect(&self.source).await?;
        let destination = MySqlDestination::connect(&self.target, self.insert_batch_size).await?;

        steps::transfer(source, destination, &self.selection).await
    }
}

/// Export, copy and transfer, in the order a scheduled run executes them.
pub fn pipeline_steps(config: &RunnerConfig) -> Vec<Box<dyn Step>> {
    vec![
        Box::new(ExportStep::new(config)),
        Box::new(CopyStep::new(config)),
        Box::new(TransferStep::new(config)),
    ]
}
