pub mod avro;
mod base;
pub mod csv;
pub mod file;
pub mod memory;
pub mod mysql;
pub mod parquet;
mod text;

pub use base::{Destination, FanoutDestination};
