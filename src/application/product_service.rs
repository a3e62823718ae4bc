use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::event::ProductEventType;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{Product, ProductInput};

use super::event_publisher::{EventPublisher, RequestContext};

/// Product CRUD. Every successful mutation is announced on the event
/// channel; publishing never affects the outcome of the mutation.
pub struct ProductService<R> {
    repo: R,
    publisher: EventPublisher,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repo: R, publisher: EventPublisher) -> Self {
        Self { repo, publisher }
    }

    pub fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        self.repo.get_all()
    }

    pub fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.repo.get_by_id(id)
    }

    pub fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, DomainError> {
        self.repo.get_by_ids(ids)
    }

    pub fn create_product(
        &self,
        input: ProductInput,
        ctx: &RequestContext,
    ) -> Result<Product, DomainError> {
        input.validate()?;
        let product = self.repo.create(input)?;
        log::info!("Created product {} ({})", product.id, product.code);
        self.publisher.publish(&product, ProductEventType::Created, ctx);
        Ok(product)
    }

    pub fn update_product(
        &self,
        id: Uuid,
        input: ProductInput,
        ctx: &RequestContext,
    ) -> Result<Product, DomainError> {
        input.validate()?;
        let product = self.repo.update(id, input)?;
        log::info!("Updated product {} ({})", product.id, product.code);
        self.publisher.publish(&product, ProductEventType::Updated, ctx);
        Ok(product)
    }

    pub fn delete_product(&self, id: Uuid, ctx: &RequestContext) -> Result<Product, DomainError> {
        let product = self.repo.delete(id)?;
        log::info!("Deleted product {} ({})", product.id, product.code);
        self.publisher.publish(&product, ProductEventType::Deleted, ctx);
        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use bigdecimal::BigDecimal;
    use tokio::sync::mpsc;

    use super::*;
    use crate::clock::SystemClock;
    use crate::domain::event::ProductEvent;
    use crate::infrastructure::store::InMemoryStore;
    use crate::infrastructure::KvProductRepository;

    fn service(
        capacity: usize,
    ) -> (
        ProductService<KvProductRepository>,
        mpsc::Receiver<ProductEvent>,
    ) {
        let clock = Arc::new(SystemClock);
        let store = Arc::new(InMemoryStore::new(clock.clone()));
        let (publisher, rx) = EventPublisher::channel(capacity, clock);
        let repo = KvProductRepository::new(store, "products");
        (ProductService::new(repo, publisher), rx)
    }

    fn ctx() -> RequestContext {
        RequestContext {
            actor_email: "ops@example.com".to_string(),
            request_id: "req-1".to_string(),
        }
    }

    fn input(code: &str, price: &str) -> ProductInput {
        ProductInput {
            product_name: format!("Product {code}"),
            code: code.to_string(),
            model: String::new(),
            product_url: String::new(),
            price: BigDecimal::from_str(price).expect("valid decimal"),
        }
    }

    fn drain(rx: &mut mpsc::Receiver<ProductEvent>) -> Vec<ProductEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn each_mutation_publishes_one_event() {
        let (service, mut rx) = service(16);

        let created = service
            .create_product(input("A", "1.00"), &ctx())
            .expect("create failed");
        service
            .update_product(created.id, input("A", "2.00"), &ctx())
            .expect("update failed");
        service
            .delete_product(created.id, &ctx())
            .expect("delete failed");

        let types: Vec<ProductEventType> = drain(&mut rx).iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                ProductEventType::Created,
                ProductEventType::Updated,
                ProductEventType::Deleted
            ]
        );
    }

    #[test]
    fn delete_event_carries_pre_deletion_values() {
        let (service, mut rx) = service(16);
        let created = service
            .create_product(input("GONE", "49.90"), &ctx())
            .expect("create failed");
        drain(&mut rx);

        service
            .delete_product(created.id, &ctx())
            .expect("delete failed");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ProductEventType::Deleted);
        assert_eq!(events[0].product_code, "GONE");
        assert_eq!(events[0].product_id, created.id);
        assert_eq!(events[0].product_price, created.price);
        assert!(matches!(
            service.get_product(created.id),
            Err(DomainError::NotFound("Product"))
        ));
    }

    #[test]
    fn failed_mutations_publish_nothing() {
        let (service, mut rx) = service(16);

        assert!(service
            .update_product(Uuid::new_v4(), input("A", "1"), &ctx())
            .is_err());
        assert!(service.delete_product(Uuid::new_v4(), &ctx()).is_err());
        assert!(service
            .create_product(input("", "1"), &ctx())
            .is_err());

        assert!(drain(&mut rx).is_empty());
        assert!(service.list_products().expect("list failed").is_empty());
    }

    #[test]
    fn mutation_succeeds_even_when_events_are_dropped() {
        let (service, rx) = service(1);
        drop(rx);

        let created = service
            .create_product(input("A", "1"), &ctx())
            .expect("create must not depend on event delivery");
        assert_eq!(
            service.get_product(created.id).expect("get failed"),
            created
        );
    }
}
