/// Error types for MineTable
///
/// Every failure surfaced to a caller is a `TableError`. Each variant belongs
/// to one `ErrorKind`, which is what front ends report and what tests match on.
/// None of these are fatal: a rejected action leaves the session untouched.

use crate::column::ColumnType;
use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a `TableError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unsupported method name or invalid parameter combination
    Value,
    /// Operation applied to a column of the wrong type
    Type,
    /// Operation requested on an empty session or exhausted history
    State,
    /// Referenced column or row does not exist
    Key,
    /// Reading or writing a file failed
    Io,
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("unsupported {operation} method '{method}'")]
    UnsupportedMethod {
        operation: &'static str,
        method: String,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("malformed CSV: {0}")]
    MalformedCsv(String),

    #[error("column '{column}' has type {actual:?}, expected a numeric column")]
    NotNumeric { column: String, actual: ColumnType },

    #[error("type mismatch in column '{column}': expected {expected:?}, got {found}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        found: String,
    },

    #[error("no dataset loaded")]
    NoData,

    #[error("nothing to undo: {0}")]
    NothingToUndo(String),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("row {row} out of range [0, {len})")]
    RowOutOfRange { row: usize, len: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::UnsupportedMethod { .. }
            | TableError::InvalidParameter(_)
            | TableError::MalformedCsv(_) => ErrorKind::Value,
            TableError::NotNumeric { .. } | TableError::TypeMismatch { .. } => ErrorKind::Type,
            TableError::NoData | TableError::NothingToUndo(_) => ErrorKind::State,
            TableError::ColumnNotFound(_) | TableError::RowOutOfRange { .. } => ErrorKind::Key,
            TableError::Csv(e) if !e.is_io_error() => ErrorKind::Value,
            TableError::Csv(_) | TableError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn unsupported(operation: &'static str, method: &str) -> Self {
        TableError::UnsupportedMethod {
            operation,
            method: method.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(TableError::unsupported("outlier", "median").kind(), ErrorKind::Value);
        assert_eq!(
            TableError::NotNumeric {
                column: "name".to_string(),
                actual: ColumnType::String,
            }
            .kind(),
            ErrorKind::Type
        );
        assert_eq!(TableError::NoData.kind(), ErrorKind::State);
        assert_eq!(TableError::ColumnNotFound("lat".to_string()).kind(), ErrorKind::Key);
    }

    #[test]
    fn test_error_messages() {
        let err = TableError::unsupported("normalization", "robust");
        assert_eq!(err.to_string(), "unsupported normalization method 'robust'");

        let err = TableError::RowOutOfRange { row: 7, len: 3 };
        assert_eq!(err.to_string(), "row 7 out of range [0, 3)");
    }
}
