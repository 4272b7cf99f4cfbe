mod health_check;
mod home;
mod newsletter_subscription;
mod not_found;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
pub use health_check::*;
pub use home::*;
pub use newsletter_subscription::*;
pub use not_found::*;
use serde::Serialize;

/// Every JSON body we return, except validation errors, is just a message
#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

fn json_message(
    status: StatusCode,
    message: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(Message { message })
}
