//! Helpers for testing pipelines without a database.
//!
//! [`source::MemorySource`] serves record batches from memory, [`table`] builds the small
//! sample tables used across tests, and [`destination::FailingDestination`] rejects writes.

pub mod destination;
pub mod source;
pub mod table;
