use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    DebitCard,
    CreditCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShippingType {
    Economic,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Carrier {
    Correios,
    Fedex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shipping {
    pub kind: ShippingType,
    pub carrier: Carrier,
}

/// Product snapshot taken when the order was placed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub code: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Billing {
    pub payment: PaymentMethod,
    pub total_price: BigDecimal,
}

/// A validated order request, before product resolution.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub email: String,
    pub product_ids: Vec<Uuid>,
    pub payment: PaymentMethod,
    pub shipping: Shipping,
}

/// An order ready to be persisted; the repository assigns id and creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub email: String,
    pub lines: Vec<OrderLine>,
    pub billing: Billing,
    pub shipping: Shipping,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub email: String,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
    pub billing: Billing,
    pub shipping: Shipping,
}

impl Order {
    pub fn from_new(id: Uuid, created_at: DateTime<Utc>, order: NewOrder) -> Self {
        Self {
            email: order.email,
            id,
            created_at,
            lines: order.lines,
            billing: order.billing,
            shipping: order.shipping,
        }
    }
}
