pub mod event_log;
pub mod models;
pub mod order_repo;
pub mod product_repo;
pub mod store;

pub use event_log::KvEventLog;
pub use order_repo::KvOrderRepository;
pub use product_repo::KvProductRepository;
