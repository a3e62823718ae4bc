use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::clock::Clock;
use crate::domain::event::{ProductEvent, ProductEventType};
use crate::domain::ports::EventLog;
use crate::domain::product::Product;

/// Who triggered a mutation, and which request it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub actor_email: String,
    pub request_id: String,
}

/// Fire-and-forget side of the product event channel.
///
/// `publish` never waits: when the channel is full or the worker is gone the
/// event is dropped and a warning is logged.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::Sender<ProductEvent>,
    clock: Arc<dyn Clock>,
}

impl EventPublisher {
    pub fn channel(
        capacity: usize,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::Receiver<ProductEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx, clock }, rx)
    }

    /// Returns whether the event was handed to the channel.
    pub fn publish(
        &self,
        product: &Product,
        event_type: ProductEventType,
        ctx: &RequestContext,
    ) -> bool {
        let event = ProductEvent {
            email: ctx.actor_email.clone(),
            event_type,
            product_code: product.code.clone(),
            product_id: product.id,
            product_price: product.price.clone(),
            request_id: ctx.request_id.clone(),
            timestamp: self.clock.now(),
        };

        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                log::warn!(
                    "Event channel full, {} event for product {} dropped",
                    event.event_type,
                    event.product_id
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                log::warn!(
                    "Event channel closed, {} event for product {} dropped",
                    event.event_type,
                    event.product_id
                );
                false
            }
        }
    }
}

/// Consumes the channel and appends each event to the log.
pub struct EventWorker<L> {
    log: Arc<L>,
    rx: mpsc::Receiver<ProductEvent>,
}

impl<L: EventLog> EventWorker<L> {
    pub fn new(log: Arc<L>, rx: mpsc::Receiver<ProductEvent>) -> Self {
        Self { log, rx }
    }

    /// Run until every publisher has been dropped.
    pub async fn run(mut self) {
        log::info!("Product event worker started");

        while let Some(event) = self.rx.recv().await {
            let event_log = Arc::clone(&self.log);
            let request_id = event.request_id.clone();
            match tokio::task::spawn_blocking(move || event_log.append(event)).await {
                Ok(Ok(record)) => log::debug!(
                    "Recorded {} event for product {} (request {})",
                    record.event.event_type,
                    record.event.product_code,
                    request_id
                ),
                Ok(Err(e)) => log::error!(
                    "Failed to record product event for request {}: {}",
                    request_id,
                    e
                ),
                Err(e) => log::error!("Product event append task panicked: {}", e),
            }
        }

        log::info!("Product event channel closed, worker stopping");
    }
}
