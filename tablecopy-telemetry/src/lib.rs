//! Logging and metrics setup shared by tablecopy binaries and tests.

pub mod metrics;
pub mod tracing;
