pub mod event_publisher;
pub mod order_service;
pub mod product_service;

pub use event_publisher::{EventPublisher, EventWorker, RequestContext};
pub use order_service::OrderService;
pub use product_service::ProductService;
