use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order};
use crate::domain::ports::OrderRepository;

use super::models::OrderItem;
use super::product_repo::conditional_error;
use super::store::{Condition, ItemKey, KeyValueStore, StoredItem};

/// Orders keyed by `(customer email, order id)`: one partition per customer,
/// so a customer's orders are a single range query.
pub struct KvOrderRepository {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    table: String,
}

impl KvOrderRepository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            table: table.into(),
        }
    }

    fn key(email: &str, order_id: Uuid) -> ItemKey {
        ItemKey::new(email, order_id.to_string())
    }

    fn decode(item: StoredItem) -> Result<Order, DomainError> {
        let item: OrderItem = serde_json::from_value(item.value)?;
        Ok(item.into())
    }

    fn decode_all(items: Vec<StoredItem>) -> Result<Vec<Order>, DomainError> {
        items.into_iter().map(Self::decode).collect()
    }
}

impl OrderRepository for KvOrderRepository {
    fn get_all(&self) -> Result<Vec<Order>, DomainError> {
        Self::decode_all(self.store.scan(&self.table)?)
    }

    fn get_by_customer(&self, email: &str) -> Result<Vec<Order>, DomainError> {
        Self::decode_all(self.store.query(&self.table, email)?)
    }

    fn get_one(&self, email: &str, order_id: Uuid) -> Result<Order, DomainError> {
        let item = self
            .store
            .get(&self.table, &Self::key(email, order_id))?
            .ok_or(DomainError::NotFound("Order"))?;
        Self::decode(item)
    }

    fn create(&self, order: NewOrder) -> Result<Order, DomainError> {
        let order = Order::from_new(Uuid::new_v4(), self.clock.now(), order);
        let value = serde_json::to_value(OrderItem::from(&order))?;
        self.store
            .put(&self.table, Self::key(&order.email, order.id), value, None)?;
        Ok(order)
    }

    fn delete(&self, email: &str, order_id: Uuid) -> Result<Order, DomainError> {
        let removed = self
            .store
            .delete(&self.table, &Self::key(email, order_id), Condition::Exists)
            .map_err(|e| conditional_error("Order", e))?;
        Self::decode(removed)
    }
}
