//! Worker-side cache for distributed matrix rows.
//!
//! Rows pulled from the parameter servers, or updated locally before a
//! push, are kept in a [`MatrixStore`]: one [`RowStore`] per matrix, one
//! shared vector per row. The cache never performs I/O and never evicts on
//! its own; callers decide what to fetch and what to drop.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use psagent_storage::MatrixStore;
//! use psagent_types::RowVector;
//!
//! let cache: Arc<MatrixStore> = Arc::new(MatrixStore::new());
//! cache.put_row(1, 0, Arc::new(RowVector::dense(vec![1.0, 2.0])));
//!
//! match cache.get_row(1, 0) {
//!     Some(row) => assert_eq!(row.dim(), 2),
//!     None => unreachable!("row was just cached"),
//! }
//! ```

pub mod config;
pub mod error;
pub mod memory;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use memory::{MatrixStore, MatrixStoreStats, RowStore};
