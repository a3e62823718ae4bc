use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use ecommerce_service::clock::{Clock, SystemClock};
use ecommerce_service::config::{Config, StoreBackend};
use ecommerce_service::infrastructure::store::sweeper::spawn_expiry_sweeper;
use ecommerce_service::infrastructure::store::{InMemoryStore, KeyValueStore, PostgresStore};
use ecommerce_service::{build_server, create_pool, run_migrations, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn KeyValueStore> = match config.backend {
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(InMemoryStore::new(Arc::clone(&clock)))
        }
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let pool = create_pool(database_url).map_err(std::io::Error::other)?;
            run_migrations(&pool).map_err(std::io::Error::other)?;
            Arc::new(PostgresStore::new(pool, Arc::clone(&clock)))
        }
    };

    let (state, worker) = AppState::new(Arc::clone(&store), clock, &config);
    tokio::spawn(worker.run());
    spawn_expiry_sweeper(
        store,
        Duration::from_secs(config.expiry_sweep_interval_secs.max(1)),
    );

    log::info!(
        "Starting server at http://{}:{} ({:?} store, events expire after {}s)",
        config.host,
        config.port,
        config.backend,
        config.event_ttl_secs
    );

    build_server(state, &config.host, config.port)?.await
}
