//! Metric names and labels recorded by pipelines and the scheduler.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

/// Label for the table name.
pub const TABLE_NAME_LABEL: &str = "table_name";

/// Label for the destination name, e.g. `csv` or `mysql`.
pub const DESTINATION_LABEL: &str = "destination";

/// Label for the scheduled step name.
pub const STEP_LABEL: &str = "step";

/// Label for the outcome of a step, `success` or `failure`.
pub const OUTCOME_LABEL: &str = "outcome";

/// Counter of tables written to a destination.
pub const TABLECOPY_TABLES_WRITTEN_TOTAL: &str = "tablecopy_tables_written_total";

/// Counter of rows written to a destination.
pub const TABLECOPY_ROWS_WRITTEN_TOTAL: &str = "tablecopy_rows_written_total";

/// Histogram of the time to read and write one table.
pub const TABLECOPY_TABLE_DURATION_SECONDS: &str = "tablecopy_table_duration_seconds";

/// Counter of finished scheduled steps by outcome.
pub const TABLECOPY_STEPS_TOTAL: &str = "tablecopy_steps_total";

/// Histogram of the duration of one scheduled step.
pub const TABLECOPY_STEP_DURATION_SECONDS: &str = "tablecopy_step_duration_seconds";

/// Counter of completed scheduled runs.
pub const TABLECOPY_RUNS_TOTAL: &str = "tablecopy_runs_total";

static REGISTER_METRICS: Once = Once::new();

/// Registers descriptions for every metric, once per process.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            TABLECOPY_TABLES_WRITTEN_TOTAL,
            Unit::Count,
            "Tables written to a destination"
        );
        describe_counter!(
            TABLECOPY_ROWS_WRITTEN_TOTAL,
            Unit::Count,
            "Rows written to a destination"
        );
        describe_histogram!(
            TABLECOPY_TABLE_DURATION_SECONDS,
            Unit::Seconds,
            "Time to read one table and write it to a destination"
        );
        describe_counter!(
            TABLECOPY_STEPS_TOTAL,
            Unit::Count,
            "Scheduled steps finished, labeled by outcome"
        );
        describe_histogram!(
            TABLECOPY_STEP_DURATION_SECONDS,
            Unit::Seconds,
            "Duration of one scheduled step"
        );
        describe_counter!(
            TABLECOPY_RUNS_TOTAL,
            Unit::Count,
            "Scheduled runs completed"
        );
    });
}
