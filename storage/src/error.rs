//! Storage error types

use psagent_types::{MatrixId, RowKey};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Matrix not found: {0}")]
    MatrixNotFound(MatrixId),

    #[error("Row not found: {0}")]
    RowNotFound(RowKey),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// A cache miss: the caller should go fetch the data, not fail.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::MatrixNotFound(_) | StorageError::RowNotFound(_)
        )
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(StorageError::MatrixNotFound(1).is_not_found());
        assert!(StorageError::RowNotFound(RowKey::new(1, 2)).is_not_found());
        assert!(!StorageError::InvalidArgument("x".into()).is_not_found());
    }

    #[test]
    fn test_display() {
        let err = StorageError::RowNotFound(RowKey::new(4, 9));
        assert_eq!(err.to_string(), "Row not found: m4/r9");
    }
}
