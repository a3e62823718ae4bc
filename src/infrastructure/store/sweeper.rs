use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::KeyValueStore;

/// Periodically remove expired items from the store.
///
/// Expired items are already invisible to reads; this only reclaims space.
pub fn spawn_expiry_sweeper(store: Arc<dyn KeyValueStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let store = Arc::clone(&store);
            match tokio::task::spawn_blocking(move || store.purge_expired()).await {
                Ok(Ok(0)) => {}
                Ok(Ok(purged)) => log::debug!("Purged {} expired items", purged),
                Ok(Err(e)) => log::error!("Expiry sweep failed: {}", e),
                Err(e) => log::error!("Expiry sweep task panicked: {}", e),
            }
        }
    })
}
