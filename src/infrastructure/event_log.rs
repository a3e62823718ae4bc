use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;
use crate::domain::errors::DomainError;
use crate::domain::event::{ProductEvent, ProductEventRecord};
use crate::domain::ports::EventLog;

use super::models::ProductEventItem;
use super::store::{ItemKey, KeyValueStore};

/// Product events partitioned by product code. Each entry expires `ttl`
/// after it was appended; the store drops it from reads from then on.
pub struct KvEventLog {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    table: String,
    ttl: Duration,
}

impl KvEventLog {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        table: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            table: table.into(),
            ttl,
        }
    }
}

impl EventLog for KvEventLog {
    fn append(&self, event: ProductEvent) -> Result<ProductEventRecord, DomainError> {
        let expires_at = self.clock.now() + self.ttl;
        let item = ProductEventItem::new(&event, expires_at);
        let key = ItemKey::new(item.pk.clone(), item.sk.clone());

        self.store.put(
            &self.table,
            key,
            serde_json::to_value(&item)?,
            Some(expires_at),
        )?;
        Ok(ProductEventRecord {
            event,
            ttl: expires_at,
        })
    }

    fn events_for_product(&self, code: &str) -> Result<Vec<ProductEventRecord>, DomainError> {
        self.store
            .query(&self.table, &ProductEventItem::partition_for(code))?
            .into_iter()
            .map(|stored| -> Result<ProductEventRecord, DomainError> {
                let item: ProductEventItem = serde_json::from_value(stored.value)?;
                Ok(item.into_record(stored.expires_at))
            })
            .collect()
    }
}
