//! Error taxonomy for the extraction pipeline.

use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::errors::ParquetError;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid date {value:?}: expected YYYY-MM with month 01..12")]
    InvalidDateFormat { value: String },

    #[error("invalid date range: end {end} precedes start {start}")]
    InvalidDateRange { start: String, end: String },

    #[error("directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("permission denied: {}", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: FileReadSource,
    },

    #[error("read of {} did not finish within {timeout:?}", .path.display())]
    ReadTimeout { path: PathBuf, timeout: Duration },

    #[error("character {ch:?} in row {row}, column {column:?} is not representable in ISO-8859-1")]
    Encoding { row: usize, column: String, ch: char },

    /// Export of an extracted table failed; the table is handed back so it
    /// stays usable (e.g. exported again with other columns).
    #[error("export to {} failed: {source}", .path.display())]
    Export {
        path: PathBuf,
        table: Box<RecordBatch>,
        #[source]
        source: Box<ExtractError>,
    },

    #[error("extraction cancelled")]
    Cancelled,

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Underlying cause of a [`ExtractError::FileRead`].
#[derive(Debug, Error)]
pub enum FileReadSource {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Parquet(#[from] ParquetError),
    #[error(transparent)]
    Arrow(#[from] ArrowError),
}

impl ExtractError {
    /// Classify a filesystem error for `path` into the taxonomy.
    pub fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::DirectoryNotFound { path: path.to_path_buf() },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.to_path_buf() },
            _ => Self::Io { path: path.to_path_buf(), source: e },
        }
    }

    pub fn file_read(path: &Path, source: impl Into<FileReadSource>) -> Self {
        Self::FileRead { path: path.to_path_buf(), source: source.into() }
    }

    /// The extracted table carried by an [`ExtractError::Export`] failure.
    pub fn into_table(self) -> Option<RecordBatch> {
        match self {
            Self::Export { table, .. } => Some(*table),
            _ => None,
        }
    }

    /// Errors tied to a single data file; only these may be skipped in resilient mode.
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::FileRead { .. } | Self::ReadTimeout { .. })
    }
}
