//! Configuration for the in-memory row cache

use crate::error::{StorageError, StorageResult};

/// Sizing of the concurrent maps backing the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Matrices expected per worker (pre-allocated slots in the outer map)
    pub initial_matrix_capacity: usize,

    /// Rows pre-allocated in every newly created row store
    pub initial_row_capacity: usize,

    /// DashMap shard count. `None` lets DashMap pick from the CPU count.
    pub shard_amount: Option<usize>,
}

impl StorageConfig {
    /// Load configuration from environment variables
    ///
    /// - `PSAGENT_MATRIX_CAPACITY`
    /// - `PSAGENT_ROW_CAPACITY`
    /// - `PSAGENT_SHARD_AMOUNT`
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let initial_matrix_capacity = parse_usize(&lookup, "PSAGENT_MATRIX_CAPACITY")?
            .unwrap_or(defaults.initial_matrix_capacity);
        let initial_row_capacity = parse_usize(&lookup, "PSAGENT_ROW_CAPACITY")?
            .unwrap_or(defaults.initial_row_capacity);
        let shard_amount = parse_usize(&lookup, "PSAGENT_SHARD_AMOUNT")?.or(defaults.shard_amount);

        let config = Self {
            initial_matrix_capacity,
            initial_row_capacity,
            shard_amount,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> StorageResult<()> {
        if let Some(shards) = self.shard_amount {
            // DashMap panics on anything else
            if shards <= 1 || !shards.is_power_of_two() {
                return Err(StorageError::InvalidConfig(format!(
                    "shard amount must be a power of two greater than 1, got {}",
                    shards
                )));
            }
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            initial_matrix_capacity: 16,
            initial_row_capacity: 0,
            shard_amount: None,
        }
    }
}

fn parse_usize<F>(lookup: &F, key: &str) -> StorageResult<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| StorageError::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}
