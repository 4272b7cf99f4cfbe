use actix_web::http::StatusCode;
use actix_web::HttpResponse;

use super::json_message;

pub const NOT_FOUND_MESSAGE: &str = "Endpoint not found in this project";

/// Fallback for every request that no route matched
pub async fn not_found() -> HttpResponse { json_message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE) }
