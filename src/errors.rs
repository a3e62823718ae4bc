use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Some product was not found")]
    ProductsNotFound(Vec<Uuid>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound(entity) => AppError::NotFound(format!("{entity} not found")),
            DomainError::ProductsNotFound(ids) => AppError::ProductsNotFound(ids),
            DomainError::PreconditionFailed(entity) => {
                AppError::Conflict(format!("{entity} was modified concurrently, retry"))
            }
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::ProductsNotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ProductsNotFound(ids) => json!({
                "error": self.to_string(),
                "missingProductIds": ids,
            }),
            AppError::Internal(msg) => {
                log::error!("Request failed: {}", msg);
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
