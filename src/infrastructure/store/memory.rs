use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{check_condition, Condition, ItemKey, KeyValueStore, StoreError, StoredItem};
use crate::clock::Clock;

type Table = BTreeMap<ItemKey, StoredItem>;

/// Sorted-map store. Every mutation holds the write lock, so conditional
/// writes on the same key are serialized.
pub struct InMemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Table>>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Table>>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn live<'a>(table: &'a Table, key: &ItemKey, now: DateTime<Utc>) -> Option<&'a StoredItem> {
        table.get(key).filter(|item| !item.is_expired(now))
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, table: &str, key: &ItemKey) -> Result<Option<StoredItem>, StoreError> {
        let now = self.clock.now();
        let tables = self.read()?;
        Ok(tables
            .get(table)
            .and_then(|t| Self::live(t, key, now))
            .cloned())
    }

    fn put(
        &self,
        table: &str,
        key: ItemKey,
        value: Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<StoredItem, StoreError> {
        let now = self.clock.now();
        let mut tables = self.write()?;
        let table = tables.entry(table.to_string()).or_default();

        let version = Self::live(table, &key, now).map_or(1, |item| item.version + 1);
        let item = StoredItem {
            key: key.clone(),
            value,
            version,
            expires_at,
        };
        table.insert(key, item.clone());
        Ok(item)
    }

    fn update(
        &self,
        table: &str,
        key: &ItemKey,
        value: Value,
        condition: Condition,
    ) -> Result<StoredItem, StoreError> {
        let now = self.clock.now();
        let mut tables = self.write()?;
        let table = tables.get_mut(table).ok_or(StoreError::NotFound)?;

        let current = Self::live(table, key, now);
        check_condition(current, condition)?;

        let item = table.get_mut(key).ok_or(StoreError::NotFound)?;
        item.value = value;
        item.version += 1;
        Ok(item.clone())
    }

    fn delete(
        &self,
        table: &str,
        key: &ItemKey,
        condition: Condition,
    ) -> Result<StoredItem, StoreError> {
        let now = self.clock.now();
        let mut tables = self.write()?;
        let table = tables.get_mut(table).ok_or(StoreError::NotFound)?;

        check_condition(Self::live(table, key, now), condition)?;
        table.remove(key).ok_or(StoreError::NotFound)
    }

    fn batch_get(&self, table: &str, keys: &[ItemKey]) -> Result<Vec<StoredItem>, StoreError> {
        let now = self.clock.now();
        let tables = self.read()?;
        let Some(table) = tables.get(table) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| Self::live(table, key, now).cloned())
            .collect())
    }

    fn query(&self, table: &str, partition: &str) -> Result<Vec<StoredItem>, StoreError> {
        let now = self.clock.now();
        let tables = self.read()?;
        let Some(table) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let start = ItemKey::partition_only(partition);
        Ok(table
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(|(key, _)| key.partition == partition)
            .filter(|(_, item)| !item.is_expired(now))
            .map(|(_, item)| item.clone())
            .collect())
    }

    fn scan(&self, table: &str) -> Result<Vec<StoredItem>, StoreError> {
        let now = self.clock.now();
        let tables = self.read()?;
        Ok(tables
            .get(table)
            .map(|t| {
                t.values()
                    .filter(|item| !item.is_expired(now))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut tables = self.write()?;
        let mut purged = 0;
        for table in tables.values_mut() {
            let before = table.len();
            table.retain(|_, item| !item.is_expired(now));
            purged += before - table.len();
        }
        Ok(purged)
    }
}
