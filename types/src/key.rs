//! Row addressing

use crate::{MatrixId, RowIndex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified address of a row: which matrix, which row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub matrix_id: MatrixId,
    pub row_index: RowIndex,
}

impl RowKey {
    pub fn new(matrix_id: MatrixId, row_index: RowIndex) -> Self {
        Self {
            matrix_id,
            row_index,
        }
    }
}

impl From<(MatrixId, RowIndex)> for RowKey {
    fn from((matrix_id, row_index): (MatrixId, RowIndex)) -> Self {
        Self::new(matrix_id, row_index)
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}/r{}", self.matrix_id, self.row_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(RowKey::new(3, 17).to_string(), "m3/r17");
    }

    #[test]
    fn test_ordering_is_matrix_major() {
        let mut keys = vec![RowKey::new(2, 0), RowKey::new(1, 5), RowKey::new(1, 2)];
        keys.sort();
        assert_eq!(
            keys,
            vec![RowKey::new(1, 2), RowKey::new(1, 5), RowKey::new(2, 0)]
        );
    }
}
