//! Error types and result definitions for table copy operations.
//!
//! [`EtlError`] carries a classification, a static description, optional detail and source,
//! and the callsite where it was raised. Several errors can be aggregated into one, which the
//! scheduler uses to report every failed step of a run together.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use tablecopy_config::shared::ValidationError;
use tablecopy_mysql::read::MySqlReadError;

/// Result type used by every fallible operation in this crate.
pub type EtlResult<T> = Result<T, EtlError>;

type BoxedSource = Arc<dyn error::Error + Send + Sync>;

/// Error type for table copy operations.
///
/// Either a single classified error or an aggregate of several errors.
#[derive(Debug, Clone)]
pub struct EtlError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(Box<ErrorPayload>),
    Many {
        errors: Vec<EtlError>,
        location: &'static Location<'static>,
    },
}

#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<BoxedSource>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Categories of errors raised while reading, converting and writing tables.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection Errors
    SourceConnectionFailed,
    DestinationConnectionFailed,

    // Query & Execution Errors
    SourceQueryFailed,
    DestinationQueryFailed,

    // Schema Errors
    SourceSchemaError,

    // Data & Transformation Errors
    ConversionError,
    InvalidData,

    // Configuration Errors
    ConfigError,

    // IO & Serialization Errors
    IoError,
    DestinationIoError,
    SerializationError,

    // State & Workflow Errors
    InvalidState,
    BlockingTaskPanic,

    // General Errors
    DestinationError,

    // Unknown / Uncategorized
    Unknown,
}

impl EtlError {
    /// Returns the [`ErrorKind`] of this error, or of the first error of an aggregate.
    pub fn kind(&self) -> ErrorKind {
        match &self.repr {
            ErrorRepr::Single(payload) => payload.kind,
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(EtlError::kind)
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns every [`ErrorKind`] contained in this error, flattening aggregates.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match &self.repr {
            ErrorRepr::Single(payload) => vec![payload.kind],
            ErrorRepr::Many { errors, .. } => errors.iter().flat_map(EtlError::kinds).collect(),
        }
    }

    /// Returns the detail of this error, or the first detail found in an aggregate.
    pub fn detail(&self) -> Option<&str> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload.detail.as_deref(),
            ErrorRepr::Many { errors, .. } => errors.iter().find_map(EtlError::detail),
        }
    }

    /// Returns the backtrace captured when a single error was created.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match &self.repr {
            ErrorRepr::Single(payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns where this error was created.
    pub fn location(&self) -> &'static Location<'static> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches the error that caused this one.
    ///
    /// Aggregates ignore the call; their source is their first error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(payload) = &mut self.repr {
            payload.source = Some(Arc::new(source));
        }

        self
    }

    #[track_caller]
    fn single(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<BoxedSource>,
    ) -> Self {
        EtlError {
            repr: ErrorRepr::Single(Box::new(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            })),
        }
    }

    /// Wraps a foreign error, using its message as the detail.
    #[track_caller]
    fn wrap<E>(kind: ErrorKind, description: &'static str, err: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        let detail = err.to_string();
        EtlError::single(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl fmt::Display for EtlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line()
                )?;

                if let Some(detail) = &payload.detail {
                    write!(f, "\n  Detail:")?;
                    write_indented(f, detail, "    ")?;
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}",
                    errors.len(),
                    if errors.len() == 1 { "" } else { "s" },
                    location.file(),
                    location.line()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    write!(f, "\n  {}. {}", index + 1, lines.next().unwrap_or_default())?;
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

fn write_indented(f: &mut fmt::Formatter<'_>, text: &str, indent: &str) -> fmt::Result {
    for line in text.lines() {
        write!(f, "\n{indent}{line}")?;
    }

    Ok(())
}

impl error::Error for EtlError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

/// Creates an [`EtlError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for EtlError {
    #[track_caller]
    fn from((kind, description): (ErrorKind, &'static str)) -> EtlError {
        EtlError::single(kind, Cow::Borrowed(description), None, None)
    }
}

/// Creates an [`EtlError`] from an error kind, static description and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for EtlError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, description, detail): (ErrorKind, &'static str, D)) -> EtlError {
        EtlError::single(kind, Cow::Borrowed(description), Some(detail.into()), None)
    }
}

/// Aggregates several errors into one.
///
/// A single error is returned as is instead of being wrapped.
impl<E> From<Vec<E>> for EtlError
where
    E: Into<EtlError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> EtlError {
        let location = Location::caller();
        let mut errors: Vec<EtlError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1
            && let Some(error) = errors.pop()
        {
            return error;
        }

        EtlError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

fn connection_lost(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::PoolTimedOut
    )
}

impl From<std::io::Error> for EtlError {
    #[track_caller]
    fn from(err: std::io::Error) -> EtlError {
        EtlError::wrap(ErrorKind::IoError, "I/O operation failed", err)
    }
}

/// Untagged `sqlx` errors come from the source; the MySQL destination maps its own.
impl From<sqlx::Error> for EtlError {
    #[track_caller]
    fn from(err: sqlx::Error) -> EtlError {
        let kind = match &err {
            err if connection_lost(err) => ErrorKind::SourceConnectionFailed,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => ErrorKind::ConversionError,
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnIndexOutOfBounds { .. } => {
                ErrorKind::SourceSchemaError
            }
            _ => ErrorKind::SourceQueryFailed,
        };

        EtlError::wrap(kind, "Database operation failed", err)
    }
}

impl From<MySqlReadError> for EtlError {
    #[track_caller]
    fn from(err: MySqlReadError) -> EtlError {
        let (kind, description) = match &err {
            MySqlReadError::Query { source, .. } if connection_lost(source) => (
                ErrorKind::SourceConnectionFailed,
                "Source connection failed while reading table",
            ),
            MySqlReadError::Query { .. } => {
                (ErrorKind::SourceQueryFailed, "Reading source table failed")
            }
            MySqlReadError::Arrow { .. } => (
                ErrorKind::ConversionError,
                "Building snapshot from source rows failed",
            ),
        };

        EtlError::wrap(kind, description, err)
    }
}

impl From<ArrowError> for EtlError {
    #[track_caller]
    fn from(err: ArrowError) -> EtlError {
        let (kind, description) = match &err {
            ArrowError::IoError(_, _) => (ErrorKind::DestinationIoError, "Arrow I/O failed"),
            ArrowError::CsvError(_) => (
                ErrorKind::SerializationError,
                "Encoding record batch failed",
            ),
            ArrowError::SchemaError(_) | ArrowError::InvalidArgumentError(_) => {
                (ErrorKind::InvalidData, "Record batch is invalid")
            }
            _ => (ErrorKind::ConversionError, "Arrow conversion failed"),
        };

        EtlError::wrap(kind, description, err)
    }
}

impl From<ParquetError> for EtlError {
    #[track_caller]
    fn from(err: ParquetError) -> EtlError {
        EtlError::wrap(ErrorKind::SerializationError, "Parquet encoding failed", err)
    }
}

impl From<ValidationError> for EtlError {
    #[track_caller]
    fn from(err: ValidationError) -> EtlError {
        EtlError::wrap(ErrorKind::ConfigError, "Configuration is invalid", err)
    }
}

impl From<tokio::task::JoinError> for EtlError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> EtlError {
        if err.is_panic() {
            EtlError::wrap(ErrorKind::BlockingTaskPanic, "Blocking task panicked", err)
        } else {
            EtlError::wrap(ErrorKind::InvalidState, "Blocking task was cancelled", err)
        }
    }
}
