//! MySQL access for tablecopy.
//!
//! Provides connection pools, catalog enumeration and full-table reads into Arrow record
//! batches, plus the mapping between MySQL column types and Arrow data types used by both the
//! reader and the table writer.

pub mod db;
pub mod read;
pub mod schema;
#[cfg(feature = "test-utils")]
pub mod test_utils;
