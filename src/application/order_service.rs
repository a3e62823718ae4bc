use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderRequest};
use crate::domain::order_builder::build_order;
use crate::domain::ports::{OrderRepository, ProductRepository};

pub struct OrderService<O, P> {
    orders: O,
    products: P,
}

impl<O: OrderRepository, P: ProductRepository> OrderService<O, P> {
    pub fn new(orders: O, products: P) -> Self {
        Self { orders, products }
    }

    /// Resolve every referenced product, then persist the order.
    ///
    /// All-or-nothing: if any id does not resolve, nothing is written and the
    /// missing ids are reported. Prices are snapshotted at resolve time.
    pub fn create_order(&self, request: OrderRequest) -> Result<Order, DomainError> {
        if request.email.trim().is_empty() {
            return Err(DomainError::InvalidInput("email is required".into()));
        }
        if request.product_ids.is_empty() {
            return Err(DomainError::InvalidInput(
                "productIds must not be empty".into(),
            ));
        }

        let products = self.products.get_by_ids(&request.product_ids)?;
        if products.len() != request.product_ids.len() {
            let mut seen: HashSet<Uuid> = products.iter().map(|p| p.id).collect();
            let missing: Vec<Uuid> = request
                .product_ids
                .iter()
                .copied()
                .filter(|id| seen.insert(*id))
                .collect();
            log::warn!(
                "Rejected order for {}: {} product(s) not found",
                request.email,
                missing.len()
            );
            return Err(DomainError::ProductsNotFound(missing));
        }

        let order = self.orders.create(build_order(&request, &products))?;
        log::info!(
            "Created order {} for {} totalling {}",
            order.id,
            order.email,
            order.billing.total_price
        );
        Ok(order)
    }

    pub fn list_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.orders.get_all()
    }

    pub fn customer_orders(&self, email: &str) -> Result<Vec<Order>, DomainError> {
        self.orders.get_by_customer(email)
    }

    pub fn get_order(&self, email: &str, order_id: Uuid) -> Result<Order, DomainError> {
        self.orders.get_one(email, order_id)
    }

    pub fn delete_order(&self, email: &str, order_id: Uuid) -> Result<Order, DomainError> {
        let order = self.orders.delete(email, order_id)?;
        log::info!("Deleted order {} for {}", order.id, order.email);
        Ok(order)
    }
}
