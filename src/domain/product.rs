use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;

/// Caller-supplied product fields. The id is never part of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub product_name: String,
    pub code: String,
    pub model: String,
    pub product_url: String,
    pub price: BigDecimal,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.product_name.trim().is_empty() {
            return Err(DomainError::InvalidInput("productName is required".into()));
        }
        if self.code.trim().is_empty() {
            return Err(DomainError::InvalidInput("code is required".into()));
        }
        if self.price < BigDecimal::zero() {
            return Err(DomainError::InvalidInput(
                "price must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub product_name: String,
    pub code: String,
    pub model: String,
    pub product_url: String,
    pub price: BigDecimal,
}

impl Product {
    pub fn from_input(id: Uuid, input: ProductInput) -> Self {
        Self {
            id,
            product_name: input.product_name,
            code: input.code,
            model: input.model,
            product_url: input.product_url,
            price: input.price,
        }
    }
}
