use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductEventType {
    Created,
    Updated,
    Deleted,
}

impl ProductEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductEventType::Created => "CREATED",
            ProductEventType::Updated => "UPDATED",
            ProductEventType::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for ProductEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification emitted after a product mutation succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEvent {
    pub email: String,
    pub event_type: ProductEventType,
    pub product_code: String,
    pub product_id: Uuid,
    pub product_price: BigDecimal,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// A product event as stored in the event log, with its expiry instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductEventRecord {
    pub event: ProductEvent,
    pub ttl: DateTime<Utc>,
}
