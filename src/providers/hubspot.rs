use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;

use super::send;
use super::ProviderKind;
use super::SubscriptionError;
use crate::domain::ListId;
use crate::domain::SubscriberEmail;

pub const DEFAULT_BASE_URL: &str = "https://api.hubapi.com";

/// HubSpot CRM, "create contact". HubSpot has no notion of a newsletter list
/// here: subscribing means creating a contact.
#[derive(Debug)]
pub struct HubSpotClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

#[derive(Serialize)]
struct CreateContact<'a> {
    properties: ContactProperties<'a>,
}

#[derive(Serialize)]
struct ContactProperties<'a> {
    email: &'a str,
}

impl HubSpotClient {
    pub fn new(
        http_client: Client,
        base_url: String,
        api_key: Secret<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// `list` is accepted so all providers share one signature, but is not
    /// used.
    // TODO: map `list` onto a HubSpot contact list once product decides whether
    // lists should be supported for HubSpot at all
    #[tracing::instrument(name = "Creating HubSpot contact", skip_all)]
    pub async fn subscribe(
        &self,
        email: &SubscriberEmail,
        list: Option<&ListId>,
    ) -> Result<(), SubscriptionError> {
        if let Some(list) = list {
            tracing::debug!(%list, "HubSpot does not support lists, ignoring");
        }

        let url = format!("{}/crm/v3/objects/contacts", self.base_url);
        let body = CreateContact {
            properties: ContactProperties {
                email: email.as_ref(),
            },
        };
        let request = self
            .http_client
            .post(&url)
            .query(&[("hapikey", self.api_key.expose_secret())])
            .json(&body);

        send(ProviderKind::HubSpot, request).await
    }
}
