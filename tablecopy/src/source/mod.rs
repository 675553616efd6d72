mod base;
pub mod mysql;

pub use base::Source;
