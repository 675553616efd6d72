//! Table copy and export pipelines for MySQL databases.
//!
//! A run enumerates tables on a [`source::Source`], reads each one fully into a
//! [`types::TableSnapshot`] and hands the snapshot to a [`destination::Destination`]. The
//! destinations cover a target MySQL database and CSV, Parquet and Avro files. The
//! [`steps`] module wires these into the export, copy and transfer operations, and
//! [`scheduler`] runs them once a day.

pub mod destination;
pub mod error;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod steps;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
