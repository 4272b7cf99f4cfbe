use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;

use super::send;
use super::ProviderKind;
use super::SubscriptionError;
use crate::domain::ListId;
use crate::domain::SubscriberEmail;

pub const DEFAULT_BASE_URL: &str = "https://api.convertkit.com/v3";

/// ConvertKit v3, "add subscriber to form". A ConvertKit "list" is a form id.
#[derive(Debug)]
pub struct ConvertKitClient {
    http_client: Client,
    base_url: String,
    api_secret: Secret<String>,
    default_list: ListId,
}

#[derive(Serialize)]
struct FormSubscribe<'a> {
    api_secret: &'a str,
    email: &'a str,
}

impl ConvertKitClient {
    pub fn new(
        http_client: Client,
        base_url: String,
        api_secret: Secret<String>,
        default_list: ListId,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_secret,
            default_list,
        }
    }

    #[tracing::instrument(
        name = "Subscribing to ConvertKit form",
        skip_all,
        fields(form = tracing::field::Empty)
    )]
    pub async fn subscribe(
        &self,
        email: &SubscriberEmail,
        list: Option<&ListId>,
    ) -> Result<(), SubscriptionError> {
        let form = list.unwrap_or(&self.default_list);
        tracing::Span::current().record("form", tracing::field::display(form));

        let url = format!("{}/forms/{form}/subscribe", self.base_url);
        let body = FormSubscribe {
            api_secret: self.api_secret.expose_secret(),
            email: email.as_ref(),
        };

        send(ProviderKind::ConvertKit, self.http_client.post(&url).json(&body)).await
    }
}
