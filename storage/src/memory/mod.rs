//! In-memory row cache
//!
//! These implementations use DashMap for lock-free concurrent access.
//! Nothing here is persisted; the cache lives as long as the worker process.

pub mod matrix_store;
pub mod row_store;

pub use matrix_store::{MatrixStore, MatrixStoreStats};
pub use row_store::RowStore;
