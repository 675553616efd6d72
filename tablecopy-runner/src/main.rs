//! Table copy runner binary.
//!
//! Exports MySQL tables to CSV, Parquet and Avro files, copies them to a second database, and
//! transfers selected columns, either once or every day at a configured time.

use clap::{Parser, Subcommand};
use tablecopy::error::EtlResult;
use tablecopy::metrics::register_metrics;
use tablecopy::scheduler::{Step, run_cycle, run_scheduler};
use tablecopy_config::Environment;
use tablecopy_config::shared::{RunnerConfig, RunnerConfigWithoutSecrets};
use tablecopy_telemetry::metrics::init_metrics;
use tablecopy_telemetry::tracing::{LogFormat, init_tracing};
use tracing::{error, info};

use crate::config::load_runner_config;
use crate::core::{CopyStep, ExportStep, TransferStep, pipeline_steps};

mod config;
mod core;

#[derive(Parser)]
#[command(name = "tablecopy-runner", about = "Copies and exports MySQL tables")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Export tables to the configured file formats
    Export {
        /// Table to export; repeat for several. Defaults to the configured tables.
        #[arg(long = "table")]
        tables: Vec<String>,
    },
    /// Copy every table to the target database
    Copy,
    /// Copy the selected columns to the target database
    Transfer,
    /// Run export, copy and transfer once
    Run,
    /// Run export, copy and transfer every day at the configured time (default)
    Schedule,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Schedule);

    let config = load_runner_config()?;

    let log_format = match Environment::load()? {
        Environment::Prod => LogFormat::Json,
        Environment::Dev => LogFormat::Pretty,
    };
    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"), log_format)?;

    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
        register_metrics();
        info!(port = config.metrics.port, "serving prometheus metrics");
    }

    info!(
        config = ?RunnerConfigWithoutSecrets::from(config.clone()),
        ?command,
        "starting tablecopy runner"
    );

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async_main(command, config))?;

    Ok(())
}

async fn async_main(command: Command, config: RunnerConfig) -> anyhow::Result<()> {
    let halt_on_failure = config.schedule.halt_on_failure;

    let result = match command {
        Command::Export { tables } => {
            run_once(Box::new(ExportStep::new(&config).with_tables(tables))).await
        }
        Command::Copy => run_once(Box::new(CopyStep::new(&config))).await,
        Command::Transfer => run_once(Box::new(TransferStep::new(&config))).await,
        Command::Run => run_cycle(&pipeline_steps(&config), halt_on_failure).await,
        Command::Schedule => run_scheduler(&config.schedule, pipeline_steps(&config)).await,
    };

    if let Err(err) = result {
        error!(%err, "tablecopy runner failed");
        return Err(err.into());
    }

    info!("tablecopy runner finished successfully");
    Ok(())
}

async fn run_once(step: Box<dyn Step>) -> EtlResult<()> {
    run_cycle(&[step], true).await
}
