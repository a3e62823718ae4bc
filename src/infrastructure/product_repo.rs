use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{Product, ProductInput};

use super::models::ProductItem;
use super::store::{Condition, ItemKey, KeyValueStore, StoreError, StoredItem};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

/// Map a failed conditional write on `entity` to its domain meaning.
pub(crate) fn conditional_error(entity: &'static str, e: StoreError) -> DomainError {
    match e {
        StoreError::NotFound => DomainError::NotFound(entity),
        StoreError::ConditionFailed { .. } => DomainError::PreconditionFailed(entity),
        other => other.into(),
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct KvProductRepository {
    store: Arc<dyn KeyValueStore>,
    table: String,
}

impl KvProductRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    fn key(id: Uuid) -> ItemKey {
        ItemKey::partition_only(id.to_string())
    }

    fn decode(item: StoredItem) -> Result<Product, DomainError> {
        let item: ProductItem = serde_json::from_value(item.value)?;
        Ok(item.into())
    }
}

impl ProductRepository for KvProductRepository {
    fn get_all(&self) -> Result<Vec<Product>, DomainError> {
        self.store
            .scan(&self.table)?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    fn get_by_id(&self, id: Uuid) -> Result<Product, DomainError> {
        let item = self
            .store
            .get(&self.table, &Self::key(id))?
            .ok_or(DomainError::NotFound("Product"))?;
        Self::decode(item)
    }

    fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        let keys: Vec<ItemKey> = ids.iter().copied().map(Self::key).collect();
        self.store
            .batch_get(&self.table, &keys)?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    fn create(&self, input: ProductInput) -> Result<Product, DomainError> {
        let product = Product::from_input(Uuid::new_v4(), input);
        let value = serde_json::to_value(ProductItem::from(&product))?;
        self.store
            .put(&self.table, Self::key(product.id), value, None)?;
        Ok(product)
    }

    /// Replace every mutable field of an existing product.
    ///
    /// Reads the current version and swaps against it, so a concurrent
    /// update of the same id makes this fail with `PreconditionFailed`.
    fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, DomainError> {
        let key = Self::key(id);
        let current = self
            .store
            .get(&self.table, &key)?
            .ok_or(DomainError::NotFound("Product"))?;

        let product = Product::from_input(id, input);
        let value = serde_json::to_value(ProductItem::from(&product))?;
        self.store
            .update(&self.table, &key, value, Condition::Version(current.version))
            .map_err(|e| conditional_error("Product", e))?;
        Ok(product)
    }

    fn delete(&self, id: Uuid) -> Result<Product, DomainError> {
        let removed = self
            .store
            .delete(&self.table, &Self::key(id), Condition::Exists)
            .map_err(|e| conditional_error("Product", e))?;
        Self::decode(removed)
    }
}
