use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fmt::Display;

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::Either;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Deserialize;
use serde_json::Value;

use super::json_message;
use crate::domain::ListId;
use crate::domain::NewSubscription;
use crate::domain::SubscriberEmail;
use crate::providers::NewsletterProvider;
use crate::providers::SubscriptionError;
use crate::utils::error_chain_fmt;

pub const SUCCESS_MESSAGE: &str = "email subscribed to newsletter successfully";
pub const FAILURE_MESSAGE: &str = "email can not be signed up to newsletter";

/// Raw request body, either JSON or urlencoded.
///
/// Fields are left as `Value` so that a wrongly typed field (`"list": 3`)
/// is reported per field by `TryFrom<SubscriptionForm>`, instead of failing
/// deserialization of the whole body.
#[derive(Deserialize)]
pub struct SubscriptionForm {
    email: Option<Value>,
    list: Option<Value>,
}

/// Field name -> messages, returned as a 422
#[derive(Debug, Default)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    fn add(
        &mut self,
        field: &'static str,
        message: String,
    ) {
        self.0.entry(field).or_default().push(message);
    }

    fn is_empty(&self) -> bool { self.0.is_empty() }

    /// `{"message": <first error>, "errors": {"email": [...], ...}}`
    fn to_response(&self) -> HttpResponse {
        let first = self
            .0
            .values()
            .flatten()
            .next()
            .map(String::as_str)
            .unwrap_or("The given data was invalid.");
        HttpResponse::UnprocessableEntity().json(serde_json::json!({
            "message": first,
            "errors": self.0,
        }))
    }
}

impl Display for ValidationErrors {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "Invalid fields: {}", fields.join(", "))
    }
}

/// A submitted field, after trimming. Blank counts as absent.
enum Field {
    Absent,
    Text(String),
    NotText,
}

impl From<Option<Value>> for Field {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Field::Absent,
            Some(Value::String(s)) if s.trim().is_empty() => Field::Absent,
            Some(Value::String(s)) => Field::Text(s.trim().to_string()),
            Some(_) => Field::NotText,
        }
    }
}

impl TryFrom<SubscriptionForm> for NewSubscription {
    type Error = ValidationErrors;
    fn try_from(value: SubscriptionForm) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::default();

        let email = match Field::from(value.email) {
            Field::Absent => {
                errors.add("email", "The email field is required.".to_string());
                None
            }
            Field::Text(email) => SubscriberEmail::parse(email)
                .map_err(|e| {
                    tracing::debug!("{e}");
                    errors.add("email", "The email must be a valid email address.".to_string());
                })
                .ok(),
            Field::NotText => {
                errors.add("email", "The email must be a valid email address.".to_string());
                None
            }
        };

        let list = match Field::from(value.list) {
            Field::Absent => None,
            Field::Text(list) => ListId::parse(list)
                .map_err(|e| {
                    tracing::debug!("{e}");
                    errors.add("list", "The list must be a valid list id.".to_string());
                })
                .ok(),
            Field::NotText => {
                errors.add("list", "The list must be a string.".to_string());
                None
            }
        };

        match (email, errors.is_empty()) {
            (Some(email), true) => Ok(NewSubscription { email, list }),
            _ => Err(errors),
        }
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(ValidationErrors),
    #[error("{}", FAILURE_MESSAGE)]
    ProviderError(#[source] SubscriptionError),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ProviderError(_) => StatusCode::BAD_REQUEST,
        }
    }

    // the provider's error stays in the logs; the client only ever sees
    // `FAILURE_MESSAGE`
    fn error_response(&self) -> HttpResponse {
        match self {
            Self::ValidationError(errors) => errors.to_response(),
            Self::ProviderError(_) => json_message(StatusCode::BAD_REQUEST, FAILURE_MESSAGE),
        }
    }
}

/// A body that is neither valid JSON nor a valid form is a validation error
/// too, reported under `body`.
fn body_error<E>(err: E) -> actix_web::Error
where
    E: Debug + Display + 'static,
{
    let mut errors = ValidationErrors::default();
    errors.add("body", format!("The request body could not be parsed: {err}"));
    let resp = errors.to_response();
    InternalError::from_response(err, resp).into()
}

/// Register with `.app_data`, so that undecodable bodies get a 422
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| body_error(err))
}

/// See `json_config`
pub fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| body_error(err))
}

/// `POST /newsletter_subscription`
///
/// Subscribe `email` to `list` (or the provider's default list) with whichever
/// provider was configured at startup.
///
/// - 200 on success
/// - 422 if the body is invalid; the provider is not called
/// - 400 if the provider call failed, for whatever reason
///
/// # Request example
///
/// ```sh
///     curl --data 'email=john@foo.com' http://127.0.0.1:8000/newsletter_subscription
///     curl --json '{"email": "john@foo.com", "list": "abc123"}' \
///         http://127.0.0.1:8000/newsletter_subscription
/// ```
#[tracing::instrument(
    name = "Subscribing email to newsletter",
    skip(body, provider),
    fields(
        provider = %provider.kind(),
        subscriber_email = tracing::field::Empty,
    )
)]
pub async fn subscribe(
    // JSON is tried first, then urlencoded
    body: Either<web::Json<SubscriptionForm>, web::Form<SubscriptionForm>>,
    provider: web::Data<NewsletterProvider>,
) -> Result<HttpResponse, SubscribeError> {
    let form = match body {
        Either::Left(web::Json(form)) | Either::Right(web::Form(form)) => form,
    };

    let new_sub: NewSubscription = form.try_into().map_err(SubscribeError::ValidationError)?;
    tracing::Span::current().record("subscriber_email", tracing::field::display(&new_sub.email));

    provider
        .subscribe(&new_sub.email, new_sub.list.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(
                error.cause_chain=?e,
                error.message=%e,
                "Failed to subscribe email to newsletter"
            );
            SubscribeError::ProviderError(e)
        })?;

    Ok(json_message(StatusCode::OK, SUCCESS_MESSAGE))
}
