//! Matrix-level cache manager
//!
//! `MatrixStore` owns one [`RowStore`] per matrix id and creates them on
//! first reference. Creation goes through a single DashMap `entry` call, so
//! threads racing on an unregistered matrix all end up with the same store.
//!
//! Lookups through [`MatrixStore::get_row`] and [`MatrixStore::row_store`]
//! register the matrix as a side effect. Use [`MatrixStore::peek_row`] or
//! [`MatrixStore::find_row_store`] when a miss must leave the cache untouched.

use super::row_store::RowStore;
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use dashmap::DashMap;
use psagent_types::{MatrixId, RowIndex, RowKey, RowVector};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Point-in-time counters for a [`MatrixStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixStoreStats {
    /// Matrices currently registered
    pub matrices: usize,
    /// Rows cached across all matrices
    pub rows: usize,
    /// Row stores constructed since startup
    pub stores_created: u64,
    /// Row stores dropped by unregister/clear since startup
    pub stores_removed: u64,
}

/// Process-wide row cache: matrix id -> row store -> row.
///
/// Construct one at worker startup and share it behind an `Arc`.
#[derive(Debug)]
pub struct MatrixStore<V = RowVector> {
    matrices: DashMap<MatrixId, Arc<RowStore<V>>>,
    config: StorageConfig,
    stores_created: AtomicU64,
    stores_removed: AtomicU64,
}

impl<V> MatrixStore<V> {
    /// Create a store with default sizing
    pub fn new() -> Self {
        Self::build(StorageConfig::default())
    }

    /// Create a store sized from `config`
    pub fn with_config(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: StorageConfig) -> Self {
        let matrices = match config.shard_amount {
            Some(shards) => {
                DashMap::with_capacity_and_shard_amount(config.initial_matrix_capacity, shards)
            }
            None => DashMap::with_capacity(config.initial_matrix_capacity),
        };
        Self {
            matrices,
            config,
            stores_created: AtomicU64::new(0),
            stores_removed: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    // ========== Matrix Lifecycle ==========

    /// Ensure a row store exists for `matrix_id`. Idempotent.
    pub fn register_matrix(&self, matrix_id: MatrixId) {
        self.row_store(matrix_id);
    }

    /// Drop the row store for `matrix_id` together with all its rows.
    ///
    /// Handles obtained earlier through [`row_store`](Self::row_store) stay
    /// usable but are detached; the next reference to `matrix_id` gets a new,
    /// empty store.
    pub fn unregister_matrix(&self, matrix_id: MatrixId) {
        if let Some((_, store)) = self.matrices.remove(&matrix_id) {
            self.stores_removed.fetch_add(1, Ordering::Relaxed);
            info!(matrix_id, rows = store.len(), "Unregistered matrix");
        }
    }

    /// Get the row store for `matrix_id`, creating it if absent
    pub fn row_store(&self, matrix_id: MatrixId) -> Arc<RowStore<V>> {
        if let Some(store) = self.matrices.get(&matrix_id) {
            return Arc::clone(store.value());
        }

        let store = self.matrices.entry(matrix_id).or_insert_with(|| {
            self.stores_created.fetch_add(1, Ordering::Relaxed);
            debug!(matrix_id, "Creating row store");
            Arc::new(RowStore::with_config(matrix_id, &self.config))
        });
        Arc::clone(store.value())
    }

    /// Get the row store for `matrix_id` without creating one
    pub fn find_row_store(&self, matrix_id: MatrixId) -> Option<Arc<RowStore<V>>> {
        self.matrices
            .get(&matrix_id)
            .map(|store| Arc::clone(store.value()))
    }

    /// Like [`find_row_store`](Self::find_row_store), but a miss is an error
    pub fn require_row_store(&self, matrix_id: MatrixId) -> StorageResult<Arc<RowStore<V>>> {
        self.find_row_store(matrix_id)
            .ok_or(StorageError::MatrixNotFound(matrix_id))
    }

    pub fn contains_matrix(&self, matrix_id: MatrixId) -> bool {
        self.matrices.contains_key(&matrix_id)
    }

    /// Registered matrix ids, ascending
    pub fn matrix_ids(&self) -> Vec<MatrixId> {
        let mut ids: Vec<MatrixId> = self.matrices.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn matrix_count(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    /// Drop every matrix
    pub fn clear(&self) {
        let mut removed = 0u64;
        self.matrices.retain(|_, _| {
            removed += 1;
            false
        });
        self.stores_removed.fetch_add(removed, Ordering::Relaxed);
        debug!(matrices = removed, "Cleared matrix store");
    }

    // ========== Row Operations ==========

    /// Get a cached row. Registers `matrix_id` if it was unknown.
    pub fn get_row(&self, matrix_id: MatrixId, row_index: RowIndex) -> Option<Arc<V>> {
        self.row_store(matrix_id).get_row(row_index)
    }

    /// Get a cached row without registering `matrix_id`
    pub fn peek_row(&self, matrix_id: MatrixId, row_index: RowIndex) -> Option<Arc<V>> {
        self.find_row_store(matrix_id)?.get_row(row_index)
    }

    /// Get a cached row, reporting a miss as [`StorageError::RowNotFound`]
    pub fn get_row_or_err(
        &self,
        matrix_id: MatrixId,
        row_index: RowIndex,
    ) -> StorageResult<Arc<V>> {
        self.get_row(matrix_id, row_index)
            .ok_or(StorageError::RowNotFound(RowKey::new(matrix_id, row_index)))
    }

    /// Insert or overwrite a row, registering the matrix if needed.
    /// Returns the value it replaced.
    pub fn put_row(
        &self,
        matrix_id: MatrixId,
        row_index: RowIndex,
        row: Arc<V>,
    ) -> Option<Arc<V>> {
        self.row_store(matrix_id).put_row(row_index, row)
    }

    /// Insert a row that may be missing, e.g. one slot of a decoded pull
    /// response. A missing row is rejected and nothing is stored.
    pub fn try_put_row(
        &self,
        matrix_id: MatrixId,
        row_index: RowIndex,
        row: Option<Arc<V>>,
    ) -> StorageResult<()> {
        match row {
            Some(row) => {
                self.put_row(matrix_id, row_index, row);
                Ok(())
            }
            None => {
                let key = RowKey::new(matrix_id, row_index);
                warn!(%key, "Rejected put of absent row");
                Err(StorageError::InvalidArgument(format!("row {} has no value", key)))
            }
        }
    }

    /// Put several rows of one matrix. Each row is stored independently;
    /// there is no all-or-nothing guarantee. Returns how many were stored.
    pub fn put_rows<I>(&self, matrix_id: MatrixId, rows: I) -> usize
    where
        I: IntoIterator<Item = (RowIndex, Arc<V>)>,
    {
        let store = self.row_store(matrix_id);
        let mut count = 0;
        for (row_index, row) in rows {
            store.put_row(row_index, row);
            count += 1;
        }
        count
    }

    /// Remove a row. Unknown matrices and rows are a no-op and do not
    /// register the matrix.
    pub fn remove_row(&self, matrix_id: MatrixId, row_index: RowIndex) -> Option<Arc<V>> {
        self.find_row_store(matrix_id)?.remove_row(row_index)
    }

    /// Total rows cached across all matrices
    pub fn row_count(&self) -> usize {
        self.matrices.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn stats(&self) -> MatrixStoreStats {
        MatrixStoreStats {
            matrices: self.matrix_count(),
            rows: self.row_count(),
            stores_created: self.stores_created.load(Ordering::Relaxed),
            stores_removed: self.stores_removed.load(Ordering::Relaxed),
        }
    }
}

impl<V> Default for MatrixStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psagent_types::test_utils::dense_row;

    #[test]
    fn test_row_store_identity_is_stable() {
        let store: MatrixStore = MatrixStore::new();

        let first = store.row_store(1);
        let second = store.row_store(1);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.stats().stores_created, 1);
    }

    #[test]
    fn test_register_is_idempotent() {
        let store: MatrixStore = MatrixStore::new();
        store.register_matrix(1);
        store.put_row(1, 0, dense_row(&[1.0]));
        let before = store.row_store(1);

        store.register_matrix(1);

        assert_eq!(store.matrix_count(), 1);
        assert!(Arc::ptr_eq(&before, &store.row_store(1)));
        assert_eq!(*store.get_row(1, 0).unwrap(), RowVector::dense(vec![1.0]));
    }

    #[test]
    fn test_get_row_registers_matrix() {
        let store: MatrixStore = MatrixStore::new();

        assert!(store.get_row(3, 0).is_none());
        assert!(store.contains_matrix(3));
    }

    #[test]
    fn test_peek_and_find_do_not_register() {
        let store: MatrixStore = MatrixStore::new();

        assert!(store.peek_row(3, 0).is_none());
        assert!(store.find_row_store(3).is_none());
        assert!(!store.contains_matrix(3));
        assert_eq!(
            store.require_row_store(3).unwrap_err(),
            StorageError::MatrixNotFound(3)
        );
    }

    #[test]
    fn test_put_then_get_returns_same_value() {
        let store: MatrixStore = MatrixStore::new();
        let row = dense_row(&[1.0, 2.0]);

        store.put_row(2, 7, Arc::clone(&row));

        assert!(Arc::ptr_eq(&store.get_row(2, 7).unwrap(), &row));
        assert!(Arc::ptr_eq(&store.peek_row(2, 7).unwrap(), &row));
    }

    #[test]
    fn test_remove_row() {
        let store: MatrixStore = MatrixStore::new();
        store.put_row(1, 0, dense_row(&[1.0]));

        assert!(store.remove_row(1, 0).is_some());
        assert!(store.get_row(1, 0).is_none());
    }

    #[test]
    fn test_remove_row_on_unknown_matrix_is_noop() {
        let store: MatrixStore = MatrixStore::new();

        assert!(store.remove_row(9, 0).is_none());
        assert!(!store.contains_matrix(9));
    }

    #[test]
    fn test_unregister_gives_fresh_store() {
        let store: MatrixStore = MatrixStore::new();
        store.put_row(1, 0, dense_row(&[1.0]));
        let old = store.row_store(1);

        store.unregister_matrix(1);

        assert!(store.peek_row(1, 0).is_none());
        let fresh = store.row_store(1);
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert!(fresh.is_empty());

        let stats = store.stats();
        assert_eq!(stats.stores_created, 2);
        assert_eq!(stats.stores_removed, 1);
    }

    #[test]
    fn test_unregister_unknown_matrix_is_noop() {
        let store: MatrixStore = MatrixStore::new();
        store.unregister_matrix(5);
        assert_eq!(store.stats(), MatrixStoreStats::default());
    }

    #[test]
    fn test_try_put_row_rejects_absent_value() {
        let store: MatrixStore = MatrixStore::new();

        let err = store.try_put_row(1, 4, None).unwrap_err();
        assert!(matches!(err, StorageError::InvalidArgument(_)));
        assert!(store.peek_row(1, 4).is_none());

        assert_eq!(store.try_put_row(1, 4, Some(dense_row(&[4.0]))), Ok(()));
        assert!(store.peek_row(1, 4).is_some());

        // Overwrites report success the same way
        assert_eq!(store.try_put_row(1, 4, Some(dense_row(&[5.0]))), Ok(()));
        assert_eq!(*store.peek_row(1, 4).unwrap(), RowVector::dense(vec![5.0]));
    }

    #[test]
    fn test_get_row_or_err() {
        let store: MatrixStore = MatrixStore::new();
        store.put_row(1, 0, dense_row(&[1.0]));

        assert!(store.get_row_or_err(1, 0).is_ok());

        let err = store.get_row_or_err(1, 1).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err, StorageError::RowNotFound(RowKey::new(1, 1)));
    }

    #[test]
    fn test_put_rows_and_counts() {
        let store: MatrixStore = MatrixStore::new();

        let stored = store.put_rows(1, (0..4).map(|i| (i, dense_row(&[i as f64]))));
        store.put_row(2, 0, dense_row(&[0.0]));

        assert_eq!(stored, 4);
        assert_eq!(store.row_count(), 5);
        assert_eq!(store.matrix_ids(), vec![1, 2]);
        assert_eq!(store.row_store(1).row_indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_clear() {
        let store: MatrixStore = MatrixStore::new();
        store.register_matrix(1);
        store.register_matrix(2);

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.stats().stores_removed, 2);
    }

    #[test]
    fn test_with_config_rejects_invalid_shards() {
        let config = StorageConfig {
            shard_amount: Some(3),
            ..Default::default()
        };
        assert!(MatrixStore::<RowVector>::with_config(config).is_err());
    }

    #[test]
    fn test_with_config() {
        let config = StorageConfig {
            initial_matrix_capacity: 4,
            initial_row_capacity: 64,
            shard_amount: Some(8),
        };
        let store: MatrixStore = MatrixStore::with_config(config.clone()).unwrap();
        store.put_row(1, 0, dense_row(&[1.0]));

        assert_eq!(store.config(), &config);
        assert_eq!(store.row_count(), 1);
    }

    #[test]
    fn test_stats_serialize() {
        let store: MatrixStore = MatrixStore::new();
        store.put_row(1, 0, dense_row(&[1.0]));

        let json = serde_json::to_value(store.stats()).unwrap();
        assert_eq!(json["matrices"].as_u64(), Some(1));
        assert_eq!(json["rows"].as_u64(), Some(1));
        assert_eq!(json["stores_created"].as_u64(), Some(1));
    }
}
