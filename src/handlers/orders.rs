use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{Carrier, Order, OrderRequest, PaymentMethod, Shipping, ShippingType};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct ShippingDto {
    #[serde(rename = "type")]
    pub kind: ShippingType,
    pub carrier: Carrier,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub email: String,
    pub product_ids: Vec<Uuid>,
    #[serde(alias = "paymentMethod")]
    pub payment: PaymentMethod,
    pub shipping: ShippingDto,
}

impl From<CreateOrderRequest> for OrderRequest {
    fn from(r: CreateOrderRequest) -> Self {
        OrderRequest {
            email: r.email,
            product_ids: r.product_ids,
            payment: r.payment,
            shipping: Shipping {
                kind: r.shipping.kind,
                carrier: r.shipping.carrier,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderProductResponse {
    pub code: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingResponse {
    pub payment: PaymentMethod,
    #[schema(value_type = String)]
    pub total_price: BigDecimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub email: String,
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub products: Vec<OrderProductResponse>,
    pub billing: BillingResponse,
    pub shipping: ShippingDto,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            email: o.email,
            id: o.id,
            created_at: o.created_at,
            products: o
                .lines
                .into_iter()
                .map(|l| OrderProductResponse {
                    code: l.code,
                    price: l.price,
                })
                .collect(),
            billing: BillingResponse {
                payment: o.billing.payment,
                total_price: o.billing.total_price,
            },
            shipping: ShippingDto {
                kind: o.shipping.kind,
                carrier: o.shipping.carrier,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub email: Option<String>,
    pub order_id: Option<Uuid>,
}

fn to_responses(orders: Vec<Order>) -> Vec<OrderResponse> {
    orders.into_iter().map(OrderResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// Without parameters lists every order; with `email` lists that customer's
/// orders; with `email` and `orderId` returns the single order.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("email" = Option<String>, Query, description = "Customer email"),
        ("orderId" = Option<Uuid>, Query, description = "Order id, requires email"),
    ),
    responses(
        (status = 200, description = "Order list, or one order when orderId is given", body = Vec<OrderResponse>),
        (status = 400, description = "orderId given without email"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse, AppError> {
    let OrderQuery { email, order_id } = query.into_inner();

    match (email, order_id) {
        (Some(email), Some(order_id)) => {
            let order = web::block(move || state.orders.get_order(&email, order_id))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
        }
        (Some(email), None) => {
            let orders = web::block(move || state.orders.customer_orders(&email))
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            Ok(HttpResponse::Ok().json(to_responses(orders)))
        }
        (None, None) => {
            let orders = web::block(move || state.orders.list_orders())
                .await
                .map_err(|e| AppError::Internal(e.to_string()))??;
            Ok(HttpResponse::Ok().json(to_responses(orders)))
        }
        (None, Some(_)) => Err(AppError::BadRequest(
            "orderId requires email".to_string(),
        )),
    }
}

/// POST /orders
///
/// Every product id must resolve, otherwise nothing is stored and the
/// missing ids are returned with a 404. The total is computed server-side.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid order request"),
        (status = 404, description = "Some product was not found"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let request = OrderRequest::from(body.into_inner());

    let order = web::block(move || state.orders.create_order(request))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// DELETE /orders?email=..&orderId=..
#[utoipa::path(
    delete,
    path = "/orders",
    params(
        ("email" = String, Query, description = "Customer email"),
        ("orderId" = Uuid, Query, description = "Order id"),
    ),
    responses(
        (status = 200, description = "Order removed", body = OrderResponse),
        (status = 400, description = "Missing email or orderId"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse, AppError> {
    let OrderQuery { email, order_id } = query.into_inner();
    let (Some(email), Some(order_id)) = (email, order_id) else {
        return Err(AppError::BadRequest(
            "email and orderId are required".to_string(),
        ));
    };

    let order = web::block(move || state.orders.delete_order(&email, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
