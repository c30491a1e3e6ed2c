//! The single error type surfaced by writers and readers

use sheetcraft_xlsx::XlsxError;
use thiserror::Error;

/// Result type alias using [`ExcelIoError`]
pub type Result<T> = std::result::Result<T, ExcelIoError>;

type Cause = Box<dyn std::error::Error + Send + Sync>;

/// A human-readable message plus the lower-level failure behind it, if any.
///
/// Template problems, usage mistakes (a detail row before any category,
/// headers set twice), type metadata errors and unknown encodings all use
/// this type. I/O, archive and model failures are kept as the
/// [`source`](std::error::Error::source).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExcelIoError {
    message: String,
    #[source]
    source: Option<Cause>,
}

impl ExcelIoError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<Cause>,
    {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when a lower-level failure is attached
    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }
}

impl From<XlsxError> for ExcelIoError {
    fn from(err: XlsxError) -> Self {
        Self::with_source(err.to_string(), err)
    }
}

impl From<sheetcraft_core::Error> for ExcelIoError {
    fn from(err: sheetcraft_core::Error) -> Self {
        Self::with_source(err.to_string(), err)
    }
}

impl From<std::io::Error> for ExcelIoError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(err.to_string(), err)
    }
}
