use uuid::Uuid;

use super::errors::DomainError;
use super::event::{ProductEvent, ProductEventRecord};
use super::order::{NewOrder, Order};
use super::product::{Product, ProductInput};

pub trait ProductRepository: Send + Sync + 'static {
    /// Full scan. No pagination: fine for small catalogs only.
    fn get_all(&self) -> Result<Vec<Product>, DomainError>;
    fn get_by_id(&self, id: Uuid) -> Result<Product, DomainError>;
    /// Returns the subset of `ids` that exist, in request order.
    fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError>;
    fn create(&self, input: ProductInput) -> Result<Product, DomainError>;
    fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, DomainError>;
    fn delete(&self, id: Uuid) -> Result<Product, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn get_all(&self) -> Result<Vec<Order>, DomainError>;
    fn get_by_customer(&self, email: &str) -> Result<Vec<Order>, DomainError>;
    fn get_one(&self, email: &str, order_id: Uuid) -> Result<Order, DomainError>;
    fn create(&self, order: NewOrder) -> Result<Order, DomainError>;
    fn delete(&self, email: &str, order_id: Uuid) -> Result<Order, DomainError>;
}

/// Append-only, self-expiring log of product events.
pub trait EventLog: Send + Sync + 'static {
    fn append(&self, event: ProductEvent) -> Result<ProductEventRecord, DomainError>;
    fn events_for_product(&self, code: &str) -> Result<Vec<ProductEventRecord>, DomainError>;
}
