use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config for `{0}`: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts(&'static str),
    /// A selection entry names a table without any columns.
    #[error("Invalid selection: table `{0}` lists no columns")]
    EmptySelection(String),
    /// The same table appears twice in the selection.
    #[error("Invalid selection: table `{0}` is listed more than once")]
    DuplicateSelection(String),
    /// The schedule time is not `HH:MM` or `HH:MM:SS`.
    #[error("Invalid schedule time `{0}`: expected `HH:MM` or `HH:MM:SS`")]
    InvalidScheduleTime(String),
    /// No export format is enabled.
    #[error("`export.formats` must contain at least one format")]
    NoExportFormats,
    /// A field failed a constraint check.
    #[error("Invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
