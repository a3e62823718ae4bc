//! Key-value store port used by the repositories.
//!
//! Items live in named tables and are addressed by a partition key plus a
//! sort key. Single-key tables use an empty sort key. Every item carries a
//! version that is bumped on each write, which is what conditional writes
//! compare against.

pub mod memory;
pub mod postgres;
pub mod sweeper;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    pub partition: String,
    pub sort: String,
}

impl ItemKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }

    pub fn partition_only(partition: impl Into<String>) -> Self {
        Self::new(partition, String::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub key: ItemKey,
    pub value: Value,
    pub version: u64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredItem {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Precondition for a conditional update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Apply iff the key currently exists.
    Exists,
    /// Apply iff the key exists at exactly this version.
    Version(u64),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item not found")]
    NotFound,
    #[error("condition failed: expected version {expected}, found {actual}")]
    ConditionFailed { expected: u64, actual: u64 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, table: &str, key: &ItemKey) -> Result<Option<StoredItem>, StoreError>;

    /// Unconditional upsert.
    fn put(
        &self,
        table: &str,
        key: ItemKey,
        value: Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<StoredItem, StoreError>;

    /// Replace the value of an existing item if `condition` holds.
    fn update(
        &self,
        table: &str,
        key: &ItemKey,
        value: Value,
        condition: Condition,
    ) -> Result<StoredItem, StoreError>;

    /// Remove an item if `condition` holds, returning what was removed.
    fn delete(
        &self,
        table: &str,
        key: &ItemKey,
        condition: Condition,
    ) -> Result<StoredItem, StoreError>;

    /// Found items in request order; missing keys are skipped.
    fn batch_get(&self, table: &str, keys: &[ItemKey]) -> Result<Vec<StoredItem>, StoreError>;

    /// Every item of one partition, ordered by sort key.
    fn query(&self, table: &str, partition: &str) -> Result<Vec<StoredItem>, StoreError>;

    fn scan(&self, table: &str) -> Result<Vec<StoredItem>, StoreError>;

    /// Physically remove expired items. Returns how many were removed.
    fn purge_expired(&self) -> Result<usize, StoreError>;
}

/// Check `condition` against the current state of a key.
pub(crate) fn check_condition(
    current: Option<&StoredItem>,
    condition: Condition,
) -> Result<(), StoreError> {
    let current = current.ok_or(StoreError::NotFound)?;
    match condition {
        Condition::Exists => Ok(()),
        Condition::Version(expected) if expected == current.version => Ok(()),
        Condition::Version(expected) => Err(StoreError::ConditionFailed {
            expected,
            actual: current.version,
        }),
    }
}
