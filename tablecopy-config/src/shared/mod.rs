//! Configuration types shared by the tablecopy crates.

mod base;
mod connection;
mod copy;
mod export;
mod metrics;
mod runner;
mod schedule;
mod selection;

pub use base::ValidationError;
pub use connection::{MySqlConnectionConfig, MySqlConnectionConfigWithoutSecrets, TlsConfig};
pub use copy::CopyConfig;
pub use export::{ExportConfig, ExportFormat};
pub use metrics::MetricsConfig;
pub use runner::{RunnerConfig, RunnerConfigWithoutSecrets};
pub use schedule::ScheduleConfig;
pub use selection::TableColumns;
