pub mod orders;
pub mod products;

use actix_web::HttpRequest;
use uuid::Uuid;

use crate::application::RequestContext;
use crate::errors::AppError;

pub const ACTOR_HEADER: &str = "x-actor-email";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Actor and correlation id for event publishing, taken from request headers.
pub fn request_context(req: &HttpRequest, default_actor: &str) -> RequestContext {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    RequestContext {
        actor_email: header(ACTOR_HEADER).unwrap_or_else(|| default_actor.to_string()),
        request_id: header(REQUEST_ID_HEADER).unwrap_or_else(|| Uuid::new_v4().to_string()),
    }
}

/// Fallback for unknown routes and unsupported methods.
pub async fn bad_request() -> Result<actix_web::HttpResponse, AppError> {
    Err(AppError::BadRequest("unsupported route or method".to_string()))
}
