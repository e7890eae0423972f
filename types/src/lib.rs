//! Shared types for the parameter-server worker agent.
//!
//! Matrices are identified by a [`MatrixId`], rows within a matrix by a
//! [`RowIndex`]. Row contents travel as [`RowVector`] values, which the
//! storage layer treats as opaque.

// ========== Core Modules ==========
pub mod key;
pub mod row;

/// Identifier of a distributed matrix, assigned by the parameter-server master.
pub type MatrixId = i32;

/// Index of a row within one matrix.
pub type RowIndex = i32;

pub use key::RowKey;
pub use row::{RowVector, RowVectorError};

#[cfg(feature = "test-utils")]
pub use row::test_utils;
