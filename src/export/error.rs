//! Export error types
//!
//! Fatal conditions that abort an export run. Per-window skips (no data,
//! file already present) are not errors, see [`super::SkipReason`].

use std::path::PathBuf;
use thiserror::Error;

use crate::source::SourceError;

/// Errors that terminate an export run
#[derive(Error, Debug)]
pub enum ExportError {
    /// A `--start`/`--end` value was not a `YYYY-MM-DD` date
    #[error("Invalid date format: {0:?}. Please use YYYY-MM-DD.")]
    InvalidDateFormat(String),

    /// The data source could not be reached
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The data source rejected or failed the query
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A CSV row's field set disagrees with the header taken from the first point
    #[error(
        "Heterogeneous schema in {}: row {row} has fields {found:?}, header is {expected:?}",
        .path.display()
    )]
    HeterogeneousSchema {
        path: PathBuf,
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or CSV encoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<SourceError> for ExportError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable(_) | SourceError::Timeout | SourceError::Request(_) => {
                ExportError::ConnectionFailed(err.to_string())
            }
            SourceError::Api { .. } | SourceError::Query(_) | SourceError::Decode(_) => {
                ExportError::QueryFailed(err.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExportError::InvalidDateFormat("2023-13-01".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid date format: \"2023-13-01\". Please use YYYY-MM-DD."
        );

        let err = ExportError::HeterogeneousSchema {
            path: PathBuf::from("data_cpu_2023_01_01.csv"),
            row: 2,
            expected: vec!["time".into(), "value".into()],
            found: vec!["time".into(), "host".into()],
        };
        assert!(err.to_string().contains("data_cpu_2023_01_01.csv"));
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_source_error_mapping() {
        let err: ExportError = SourceError::Unavailable("refused".into()).into();
        assert!(matches!(err, ExportError::ConnectionFailed(_)));

        let err: ExportError = SourceError::Timeout.into();
        assert!(matches!(err, ExportError::ConnectionFailed(_)));

        let err: ExportError = SourceError::Query("measurement not found".into()).into();
        assert!(matches!(err, ExportError::QueryFailed(_)));

        let err: ExportError = SourceError::Api {
            status: 400,
            message: "error parsing query".into(),
        }
        .into();
        assert!(matches!(err, ExportError::QueryFailed(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ExportError = io_err.into();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
