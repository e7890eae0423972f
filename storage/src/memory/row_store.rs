//! Per-matrix row storage

use crate::config::StorageConfig;
use dashmap::DashMap;
use psagent_types::{MatrixId, RowIndex, RowVector};
use std::sync::Arc;
use tracing::{debug, trace};

/// Rows of a single matrix, keyed by row index.
///
/// Values are shared handles: a row read from the store is the same
/// allocation that was put, never a copy. Writes to one index are
/// last-writer-wins.
#[derive(Debug)]
pub struct RowStore<V = RowVector> {
    matrix_id: MatrixId,
    rows: DashMap<RowIndex, Arc<V>>,
}

impl<V> RowStore<V> {
    /// Create an empty row store sized from `config`. Only [`MatrixStore`]
    /// builds row stores, so every store belongs to a registered matrix.
    ///
    /// `config` must already be validated.
    ///
    /// [`MatrixStore`]: super::MatrixStore
    pub(crate) fn with_config(matrix_id: MatrixId, config: &StorageConfig) -> Self {
        let rows = match config.shard_amount {
            Some(shards) => {
                DashMap::with_capacity_and_shard_amount(config.initial_row_capacity, shards)
            }
            None => DashMap::with_capacity(config.initial_row_capacity),
        };
        Self { matrix_id, rows }
    }

    pub fn matrix_id(&self) -> MatrixId {
        self.matrix_id
    }

    /// Get the row at `row_index`, if one has been put
    pub fn get_row(&self, row_index: RowIndex) -> Option<Arc<V>> {
        self.rows.get(&row_index).map(|row| Arc::clone(row.value()))
    }

    /// Insert or overwrite the row at `row_index`, returning the previous value
    pub fn put_row(&self, row_index: RowIndex, row: Arc<V>) -> Option<Arc<V>> {
        trace!(matrix_id = self.matrix_id, row_index, "Put row");
        self.rows.insert(row_index, row)
    }

    /// Remove the row at `row_index`, returning it if it was present
    pub fn remove_row(&self, row_index: RowIndex) -> Option<Arc<V>> {
        let removed = self.rows.remove(&row_index).map(|(_, row)| row);
        if removed.is_some() {
            trace!(matrix_id = self.matrix_id, row_index, "Removed row");
        }
        removed
    }

    pub fn contains_row(&self, row_index: RowIndex) -> bool {
        self.rows.contains_key(&row_index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Indices of all cached rows, ascending.
    ///
    /// A point-in-time view; rows put or removed concurrently may or may
    /// not appear.
    pub fn row_indices(&self) -> Vec<RowIndex> {
        let mut indices: Vec<RowIndex> = self.rows.iter().map(|entry| *entry.key()).collect();
        indices.sort_unstable();
        indices
    }

    /// All cached rows ordered by index, e.g. for building a push request
    pub fn snapshot(&self) -> Vec<(RowIndex, Arc<V>)> {
        let mut rows: Vec<(RowIndex, Arc<V>)> = self
            .rows
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();
        rows.sort_unstable_by_key(|(index, _)| *index);
        rows
    }

    /// Drop every row, keeping the store itself registered
    pub fn clear(&self) {
        let rows = self.rows.len();
        self.rows.clear();
        debug!(matrix_id = self.matrix_id, rows, "Cleared row store");
    }
}
