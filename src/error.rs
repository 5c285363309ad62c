//! Error types for QC summary operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for QC operations
pub type Result<T> = std::result::Result<T, QcError>;

/// Error type for QC operations
///
/// Each variant is one failure class. Callers decide per class whether a
/// sample degrades to `NA` or the error is surfaced.
#[derive(Error, Debug)]
pub enum QcError {
    /// Input file does not exist
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other I/O failure while reading an input
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row or record that could not be interpreted
    #[error("Malformed record in '{}' (line {line}): {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// A required column is absent from a table header
    #[error("Column '{column}' not found in '{}'", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// The input held no usable records
    #[error("No records found in '{}'", path.display())]
    EmptyInput { path: PathBuf },

    /// Sample is not listed in a lookup table
    #[error("Sample '{sample}' not found in '{}'", path.display())]
    UnknownSample { path: PathBuf, sample: String },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl QcError {
    /// Classify an I/O error raised while opening or reading `path`.
    pub fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            QcError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            QcError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Classify a `csv` error raised while reading `path`.
    pub fn from_csv(path: &Path, err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(source) => QcError::from_io(path, source),
            kind => QcError::Malformed {
                path: path.to_path_buf(),
                line,
                reason: describe_csv_error(kind),
            },
        }
    }

    /// Whether the error means the input simply was not there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, QcError::NotFound { .. })
    }
}

fn describe_csv_error(kind: csv::ErrorKind) -> String {
    match kind {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} fields, found {len}"),
        csv::ErrorKind::Utf8 { err, .. } => err.to_string(),
        other => format!("{other:?}"),
    }
}
