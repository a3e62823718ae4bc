pub mod errors;
pub mod event;
pub mod order;
pub mod order_builder;
pub mod ports;
pub mod product;
