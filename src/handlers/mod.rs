pub mod codec;
pub mod config;
pub mod debug;

pub use codec::*;
pub use config::*;
pub use debug::*;

use crate::error::{AppError, AppResult};
use actix_web::{HttpRequest, HttpResponse};

/// Fallback for requests no route matches, answered with the JSON error envelope.
pub async fn not_found(req: HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("No route for {} {}", req.method(), req.path())))
}
