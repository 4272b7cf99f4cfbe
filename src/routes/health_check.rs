use actix_web::HttpResponse;

/// `GET /health_check`
///
/// For the deployment platform's probes. Does not touch the newsletter
/// provider, so a provider outage doesn't take the instance out of rotation.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
