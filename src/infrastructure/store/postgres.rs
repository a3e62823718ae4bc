use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use serde_json::Value;

use super::{check_condition, Condition, ItemKey, KeyValueStore, StoreError, StoredItem};
use crate::clock::Clock;
use crate::db::DbPool;
use crate::infrastructure::models::{KvItemRow, NewKvItemRow};
use crate::schema::kv_items;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<KvItemRow> for StoredItem {
    fn from(row: KvItemRow) -> Self {
        StoredItem {
            key: ItemKey::new(row.partition_key, row.sort_key),
            value: row.item,
            version: u64::try_from(row.version).unwrap_or_default(),
            expires_at: row.expires_at,
        }
    }
}

// ── Store ────────────────────────────────────────────────────────────────────

/// All logical tables share one `kv_items` relation, keyed by
/// `(table_name, partition_key, sort_key)`. Conditional writes lock the row
/// with `SELECT ... FOR UPDATE` inside a transaction.
pub struct PostgresStore {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl PostgresStore {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    fn live(&self, rows: Vec<KvItemRow>) -> Vec<StoredItem> {
        let now = self.clock.now();
        rows.into_iter()
            .map(StoredItem::from)
            .filter(|item| !item.is_expired(now))
            .collect()
    }

    fn lock_row(
        conn: &mut PgConnection,
        table: &str,
        key: &ItemKey,
    ) -> Result<Option<KvItemRow>, diesel::result::Error> {
        kv_items::table
            .find((table, key.partition.as_str(), key.sort.as_str()))
            .for_update()
            .first::<KvItemRow>(conn)
            .optional()
    }
}

impl KeyValueStore for PostgresStore {
    fn get(&self, table: &str, key: &ItemKey) -> Result<Option<StoredItem>, StoreError> {
        let mut conn = self.pool.get()?;
        let row = kv_items::table
            .find((table, key.partition.as_str(), key.sort.as_str()))
            .first::<KvItemRow>(&mut conn)
            .optional()?;
        Ok(self.live(row.into_iter().collect()).pop())
    }

    fn put(
        &self,
        table: &str,
        key: ItemKey,
        value: Value,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<StoredItem, StoreError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(kv_items::table)
            .values(&NewKvItemRow {
                table_name: table.to_string(),
                partition_key: key.partition,
                sort_key: key.sort,
                item: value,
                version: 1,
                expires_at,
            })
            .on_conflict((
                kv_items::table_name,
                kv_items::partition_key,
                kv_items::sort_key,
            ))
            .do_update()
            .set((
                kv_items::item.eq(excluded(kv_items::item)),
                kv_items::expires_at.eq(excluded(kv_items::expires_at)),
                kv_items::version.eq(kv_items::version + 1_i64),
            ))
            .get_result::<KvItemRow>(&mut conn)?;
        Ok(row.into())
    }

    fn update(
        &self,
        table: &str,
        key: &ItemKey,
        value: Value,
        condition: Condition,
    ) -> Result<StoredItem, StoreError> {
        let now = self.clock.now();
        let mut conn = self.pool.get()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let current = Self::lock_row(conn, table, key)?
                .map(StoredItem::from)
                .filter(|item| !item.is_expired(now));
            check_condition(current.as_ref(), condition)?;

            let row = diesel::update(kv_items::table.find((
                table,
                key.partition.as_str(),
                key.sort.as_str(),
            )))
            .set((
                kv_items::item.eq(value),
                kv_items::version.eq(kv_items::version + 1_i64),
            ))
            .get_result::<KvItemRow>(conn)?;
            Ok(row.into())
        })
    }

    fn delete(
        &self,
        table: &str,
        key: &ItemKey,
        condition: Condition,
    ) -> Result<StoredItem, StoreError> {
        let now = self.clock.now();
        let mut conn = self.pool.get()?;

        conn.transaction::<_, StoreError, _>(|conn| {
            let current = Self::lock_row(conn, table, key)?
                .map(StoredItem::from)
                .filter(|item| !item.is_expired(now));
            check_condition(current.as_ref(), condition)?;

            let row = diesel::delete(kv_items::table.find((
                table,
                key.partition.as_str(),
                key.sort.as_str(),
            )))
            .get_result::<KvItemRow>(conn)?;
            Ok(row.into())
        })
    }

    fn batch_get(&self, table: &str, keys: &[ItemKey]) -> Result<Vec<StoredItem>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get()?;
        let partitions: Vec<&str> = keys.iter().map(|k| k.partition.as_str()).collect();

        let rows = kv_items::table
            .filter(kv_items::table_name.eq(table))
            .filter(kv_items::partition_key.eq_any(partitions))
            .load::<KvItemRow>(&mut conn)?;

        let found: HashMap<ItemKey, StoredItem> = self
            .live(rows)
            .into_iter()
            .map(|item| (item.key.clone(), item))
            .collect();
        Ok(keys.iter().filter_map(|k| found.get(k).cloned()).collect())
    }

    fn query(&self, table: &str, partition: &str) -> Result<Vec<StoredItem>, StoreError> {
        let mut conn = self.pool.get()?;
        let rows = kv_items::table
            .filter(kv_items::table_name.eq(table))
            .filter(kv_items::partition_key.eq(partition))
            .order(kv_items::sort_key.asc())
            .load::<KvItemRow>(&mut conn)?;
        Ok(self.live(rows))
    }

    fn scan(&self, table: &str) -> Result<Vec<StoredItem>, StoreError> {
        let mut conn = self.pool.get()?;
        let rows = kv_items::table
            .filter(kv_items::table_name.eq(table))
            .order((kv_items::partition_key.asc(), kv_items::sort_key.asc()))
            .load::<KvItemRow>(&mut conn)?;
        Ok(self.live(rows))
    }

    fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut conn = self.pool.get()?;
        let purged =
            diesel::delete(kv_items::table.filter(kv_items::expires_at.le(now))).execute(&mut conn)?;
        Ok(purged)
    }
}
