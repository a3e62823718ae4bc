//! Stored shapes: the `kv_items` rows used by the Postgres store, and the JSON
//! documents the repositories keep inside the store.

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::event::{ProductEvent, ProductEventRecord, ProductEventType};
use crate::domain::order::{
    Billing, Carrier, Order, OrderLine, PaymentMethod, Shipping, ShippingType,
};
use crate::domain::product::Product;
use crate::schema::kv_items;

// ── kv_items rows ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct KvItemRow {
    pub table_name: String,
    pub partition_key: String,
    pub sort_key: String,
    pub item: Value,
    pub version: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = kv_items)]
pub struct NewKvItemRow {
    pub table_name: String,
    pub partition_key: String,
    pub sort_key: String,
    pub item: Value,
    pub version: i64,
    pub expires_at: Option<DateTime<Utc>>,
}

// ── Products ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductItem {
    pub id: Uuid,
    pub product_name: String,
    pub code: String,
    pub price: BigDecimal,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub product_url: String,
}

impl From<&Product> for ProductItem {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id,
            product_name: p.product_name.clone(),
            code: p.code.clone(),
            price: p.price.clone(),
            model: p.model.clone(),
            product_url: p.product_url.clone(),
        }
    }
}

impl From<ProductItem> for Product {
    fn from(item: ProductItem) -> Self {
        Self {
            id: item.id,
            product_name: item.product_name,
            code: item.code,
            model: item.model,
            product_url: item.product_url,
            price: item.price,
        }
    }
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub code: String,
    pub price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingItem {
    pub payment: PaymentMethod,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingItem {
    #[serde(rename = "type")]
    pub kind: ShippingType,
    pub carrier: Carrier,
}

/// `pk` is the customer email, `sk` the order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub pk: String,
    pub sk: Uuid,
    pub created_at: DateTime<Utc>,
    pub products: Vec<OrderLineItem>,
    pub billing: BillingItem,
    pub shipping: ShippingItem,
}

impl From<&Order> for OrderItem {
    fn from(o: &Order) -> Self {
        Self {
            pk: o.email.clone(),
            sk: o.id,
            created_at: o.created_at,
            products: o
                .lines
                .iter()
                .map(|l| OrderLineItem {
                    code: l.code.clone(),
                    price: l.price.clone(),
                })
                .collect(),
            billing: BillingItem {
                payment: o.billing.payment,
                total_price: o.billing.total_price.clone(),
            },
            shipping: ShippingItem {
                kind: o.shipping.kind,
                carrier: o.shipping.carrier,
            },
        }
    }
}

impl From<OrderItem> for Order {
    fn from(item: OrderItem) -> Self {
        Self {
            email: item.pk,
            id: item.sk,
            created_at: item.created_at,
            lines: item
                .products
                .into_iter()
                .map(|l| OrderLine {
                    code: l.code,
                    price: l.price,
                })
                .collect(),
            billing: Billing {
                payment: item.billing.payment,
                total_price: item.billing.total_price,
            },
            shipping: Shipping {
                kind: item.shipping.kind,
                carrier: item.shipping.carrier,
            },
        }
    }
}

// ── Product events ───────────────────────────────────────────────────────────

/// `pk` is `#product_{code}`, `sk` is `{EVENT_TYPE}#{timestamp_millis}#{request_id}`
/// and `ttl` is the expiry instant in epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductEventItem {
    pub pk: String,
    pub sk: String,
    pub email: String,
    pub event_type: ProductEventType,
    pub product_code: String,
    pub product_id: Uuid,
    pub product_price: BigDecimal,
    pub request_id: String,
    pub created_at: i64,
    pub occurred_at: DateTime<Utc>,
    pub ttl: i64,
}

impl ProductEventItem {
    pub fn partition_for(code: &str) -> String {
        format!("#product_{code}")
    }

    pub fn sort_for(event: &ProductEvent) -> String {
        format!(
            "{}#{}#{}",
            event.event_type,
            event.timestamp.timestamp_millis(),
            event.request_id
        )
    }

    pub fn new(event: &ProductEvent, ttl: DateTime<Utc>) -> Self {
        Self {
            pk: Self::partition_for(&event.product_code),
            sk: Self::sort_for(event),
            email: event.email.clone(),
            event_type: event.event_type,
            product_code: event.product_code.clone(),
            product_id: event.product_id,
            product_price: event.product_price.clone(),
            request_id: event.request_id.clone(),
            created_at: event.timestamp.timestamp_millis(),
            occurred_at: event.timestamp,
            ttl: ttl.timestamp(),
        }
    }

    /// Rebuild the record. `expires_at` is the store's expiry for the item;
    /// the epoch-seconds `ttl` attribute is only used when it is absent.
    pub fn into_record(self, expires_at: Option<DateTime<Utc>>) -> ProductEventRecord {
        let ttl = expires_at
            .or_else(|| Utc.timestamp_opt(self.ttl, 0).single())
            .unwrap_or_default();
        ProductEventRecord {
            event: ProductEvent {
                email: self.email,
                event_type: self.event_type,
                product_code: self.product_code,
                product_id: self.product_id,
                product_price: self.product_price,
                request_id: self.request_id,
                timestamp: self.occurred_at,
            },
            ttl,
        }
    }
}
