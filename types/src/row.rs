//! Row vector values
//!
//! A row is either dense (every element stored) or sparse (sorted
//! index/value pairs over a fixed dimension). Arithmetic lives with the
//! training code; this module only carries the data.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RowVectorError {
    #[error("Sparse row has {indices} indices but {values} values")]
    LengthMismatch { indices: usize, values: usize },

    #[error("Sparse index {index} out of dimension {dim}")]
    IndexOutOfRange { index: u32, dim: u32 },

    #[error("Sparse indices must be strictly increasing (at position {0})")]
    Unsorted(usize),
}

/// Contents of one matrix row
///
/// Decoding goes through [`RowVector::sparse`], so a malformed sparse row
/// from the wire is rejected rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRowVector")]
pub enum RowVector {
    /// Every element, in column order
    Dense(Vec<f64>),

    /// Non-zero elements only
    Sparse {
        dim: u32,
        indices: Vec<u32>,
        values: Vec<f64>,
    },
}

/// Wire shape of [`RowVector`] before validation
#[derive(Deserialize)]
enum RawRowVector {
    Dense(Vec<f64>),
    Sparse {
        dim: u32,
        indices: Vec<u32>,
        values: Vec<f64>,
    },
}

impl TryFrom<RawRowVector> for RowVector {
    type Error = RowVectorError;

    fn try_from(raw: RawRowVector) -> Result<Self, Self::Error> {
        match raw {
            RawRowVector::Dense(values) => Ok(RowVector::Dense(values)),
            RawRowVector::Sparse {
                dim,
                indices,
                values,
            } => RowVector::sparse(dim, indices, values),
        }
    }
}

impl RowVector {
    pub fn dense(values: Vec<f64>) -> Self {
        RowVector::Dense(values)
    }

    /// Build a sparse row, checking that `indices` are sorted, unique and
    /// inside `dim`.
    pub fn sparse(dim: u32, indices: Vec<u32>, values: Vec<f64>) -> Result<Self, RowVectorError> {
        if indices.len() != values.len() {
            return Err(RowVectorError::LengthMismatch {
                indices: indices.len(),
                values: values.len(),
            });
        }
        for (pos, &index) in indices.iter().enumerate() {
            if index >= dim {
                return Err(RowVectorError::IndexOutOfRange { index, dim });
            }
            if pos > 0 && indices[pos - 1] >= index {
                return Err(RowVectorError::Unsorted(pos));
            }
        }
        Ok(RowVector::Sparse {
            dim,
            indices,
            values,
        })
    }

    /// Logical length of the row
    pub fn dim(&self) -> usize {
        match self {
            RowVector::Dense(values) => values.len(),
            RowVector::Sparse { dim, .. } => *dim as usize,
        }
    }

    /// Number of stored elements
    pub fn nnz(&self) -> usize {
        match self {
            RowVector::Dense(values) => values.len(),
            RowVector::Sparse { values, .. } => values.len(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, RowVector::Sparse { .. })
    }

    /// Element at column `i`. Missing sparse entries read as zero; columns
    /// past `dim()` return `None`.
    pub fn get(&self, i: usize) -> Option<f64> {
        match self {
            RowVector::Dense(values) => values.get(i).copied(),
            RowVector::Sparse {
                dim,
                indices,
                values,
            } => {
                if i >= *dim as usize {
                    return None;
                }
                let value = indices
                    .binary_search(&(i as u32))
                    .ok()
                    .and_then(|p| values.get(p).copied());
                Some(value.unwrap_or(0.0))
            }
        }
    }
}

impl From<Vec<f64>> for RowVector {
    fn from(values: Vec<f64>) -> Self {
        RowVector::Dense(values)
    }
}

#[cfg(feature = "test-utils")]
pub mod test_utils {
    use super::RowVector;
    use std::sync::Arc;

    /// Shared dense row, ready to hand to a store
    pub fn dense_row(values: &[f64]) -> Arc<RowVector> {
        Arc::new(RowVector::dense(values.to_vec()))
    }

    /// Dense row of `dim` copies of `value`
    pub fn filled_row(dim: usize, value: f64) -> Arc<RowVector> {
        Arc::new(RowVector::dense(vec![value; dim]))
    }
}
