use std::str::FromStr;

use actix_web::{web, HttpRequest, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::request_context;
use crate::domain::product::{Product, ProductInput};
use crate::errors::AppError;
use crate::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub product_name: String,
    pub code: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub product_url: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
}

impl TryFrom<ProductRequest> for ProductInput {
    type Error = AppError;

    fn try_from(r: ProductRequest) -> Result<Self, Self::Error> {
        let price = BigDecimal::from_str(r.price.trim())
            .map_err(|e| AppError::BadRequest(format!("Invalid price '{}': {}", r.price, e)))?;
        Ok(ProductInput {
            product_name: r.product_name,
            code: r.code,
            model: r.model,
            product_url: r.product_url,
            price,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub product_name: String,
    pub code: String,
    pub model: String,
    pub product_url: String,
    #[schema(value_type = String)]
    pub price: BigDecimal,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            product_name: p.product_name,
            code: p.code,
            model: p.model,
            product_url: p.product_url,
            price: p.price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListProductsParams {
    /// Comma-separated product ids for a batch lookup.
    pub ids: Option<String>,
}

fn parse_ids(raw: &str) -> Result<Vec<Uuid>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s).map_err(|_| AppError::BadRequest(format!("invalid product id '{s}'")))
        })
        .collect()
}

fn to_responses(products: Vec<Product>) -> Vec<ProductResponse> {
    products.into_iter().map(ProductResponse::from).collect()
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /products
///
/// Lists every product, or only the ones named in `ids` when given. A batch
/// lookup returns the subset that exists; callers compare lengths to detect
/// missing ids.
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("ids" = Option<String>, Query, description = "Comma-separated product ids"),
    ),
    responses(
        (status = 200, description = "Products", body = Vec<ProductResponse>),
        (status = 400, description = "Malformed id list"),
    ),
    tag = "products"
)]
pub async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let ids = query.into_inner().ids.map(|raw| parse_ids(&raw)).transpose()?;

    let products = web::block(move || match ids {
        Some(ids) => state.products.get_products(&ids),
        None => state.products.list_products(),
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(to_responses(products)))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || state.products.get_product(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// POST /products
///
/// The id is generated server-side; any id in the body is ignored. A
/// CREATED event is published once the product is stored.
#[utoipa::path(
    post,
    path = "/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid product"),
    ),
    tag = "products"
)]
pub async fn create_product(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = request_context(&req, &state.default_actor_email);
    let input = ProductInput::try_from(body.into_inner())?;

    let product = web::block(move || state.products.create_product(input, &ctx))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/products/{}", product.id)))
        .json(ProductResponse::from(product)))
}

/// PUT /products/{id}
#[utoipa::path(
    put,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid product"),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Concurrent update, retry"),
    ),
    tag = "products"
)]
pub async fn update_product(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ProductRequest>,
) -> Result<HttpResponse, AppError> {
    let ctx = request_context(&req, &state.default_actor_email);
    let id = path.into_inner();
    let input = ProductInput::try_from(body.into_inner())?;

    let product = web::block(move || state.products.update_product(id, input, &ctx))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// DELETE /products/{id}
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product removed", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn delete_product(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let ctx = request_context(&req, &state.default_actor_email);
    let id = path.into_inner();

    let product = web::block(move || state.products.delete_product(id, &ctx))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
