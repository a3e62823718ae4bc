use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),
    /// An order referenced products that do not exist. Nothing was persisted.
    #[error("Some product was not found")]
    ProductsNotFound(Vec<Uuid>),
    /// A compare-and-swap lost against a concurrent writer.
    #[error("{0} was modified concurrently")]
    PreconditionFailed(&'static str),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
