use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a file could not be turned into a [`Dataset`](super::model::Dataset).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file is missing or unreadable.
    #[error("cannot read '{}'", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a valid table of its format.
    #[error("cannot parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported file extension: .{extension}")]
    Unsupported { extension: String },
}

impl LoadError {
    pub fn file_access(path: &Path, source: std::io::Error) -> Self {
        LoadError::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Wrap any library error as a parse failure, keeping its message.
    pub fn parse(path: &Path, err: impl fmt::Display) -> Self {
        LoadError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Columns that do not share one row count.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("row {row} has {found} cells but there are only {expected} columns")]
    RowTooWide {
        row: usize,
        expected: usize,
        found: usize,
    },
}
