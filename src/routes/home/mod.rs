use actix_web::http::header::ContentType;
use actix_web::web;
use actix_web::HttpResponse;

use crate::startup::ApplicationName;

/// `/` (any method)
///
/// Informational only, e.g. "Welcome to Newsletter Backend".
pub async fn home(app_name: web::Data<ApplicationName>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!("Welcome to {} Backend", app_name.0))
}
