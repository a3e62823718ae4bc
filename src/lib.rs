pub mod application;
pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{EventPublisher, EventWorker, OrderService, ProductService};
use crate::clock::Clock;
use crate::config::Config;
use crate::errors::AppError;
use crate::infrastructure::store::KeyValueStore;
use crate::infrastructure::{KvEventLog, KvOrderRepository, KvProductRepository};

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Shared state handed to every handler.
pub struct AppState {
    pub products: ProductService<KvProductRepository>,
    pub orders: OrderService<KvOrderRepository, KvProductRepository>,
    pub default_actor_email: String,
}

impl AppState {
    /// Wire services and repositories over `store`.
    ///
    /// Returns the worker that drains published product events into the
    /// event log; the caller must spawn it or events pile up until the
    /// channel is full and then get dropped.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> (Self, EventWorker<KvEventLog>) {
        let (publisher, rx) =
            EventPublisher::channel(config.event_channel_capacity.max(1), Arc::clone(&clock));

        let event_log = Arc::new(KvEventLog::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.tables.events.clone(),
            chrono::Duration::seconds(
                config
                    .event_ttl_secs
                    .clamp(1, crate::config::MAX_EVENT_TTL_SECS),
            ),
        ));
        let product_repo =
            || KvProductRepository::new(Arc::clone(&store), config.tables.products.clone());

        let state = AppState {
            products: ProductService::new(product_repo(), publisher),
            orders: OrderService::new(
                KvOrderRepository::new(
                    Arc::clone(&store),
                    Arc::clone(&clock),
                    config.tables.orders.clone(),
                ),
                product_repo(),
            ),
            default_actor_email: config.default_actor_email.clone(),
        };

        (state, EventWorker::new(event_log, rx))
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::create_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::orders::get_orders,
        handlers::orders::create_order,
        handlers::orders::delete_order,
    ),
    components(schemas(
        handlers::products::ProductRequest,
        handlers::products::ProductResponse,
        handlers::orders::CreateOrderRequest,
        handlers::orders::OrderResponse,
    )),
    tags(
        (name = "products", description = "Product catalogue"),
        (name = "orders", description = "Customer orders"),
    )
)]
pub struct ApiDoc;

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    let openapi = ApiDoc::openapi();

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::BadRequest(err.to_string()).into()
            }))
            .wrap(Logger::default())
            .service(
                web::resource("/products")
                    .route(web::get().to(handlers::products::list_products))
                    .route(web::post().to(handlers::products::create_product))
                    .default_service(web::to(handlers::bad_request)),
            )
            .service(
                web::resource("/products/{id}")
                    .route(web::get().to(handlers::products::get_product))
                    .route(web::put().to(handlers::products::update_product))
                    .route(web::delete().to(handlers::products::delete_product))
                    .default_service(web::to(handlers::bad_request)),
            )
            .service(
                web::resource("/orders")
                    .route(web::get().to(handlers::orders::get_orders))
                    .route(web::post().to(handlers::orders::create_order))
                    .route(web::delete().to(handlers::orders::delete_order))
                    .default_service(web::to(handlers::bad_request)),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            .default_service(web::to(handlers::bad_request))
    })
    .bind((host.to_string(), port))?
    .run())
}
