//! Newsletter providers: one adapter per remote service, and the enum that
//! dispatches to whichever one was configured.

mod convert_kit;
mod factory;
mod hubspot;
mod mailchimp;

use std::fmt::Debug;
use std::fmt::Display;

pub use convert_kit::ConvertKitClient;
pub use factory::build_provider;
pub use factory::ConfigurationError;
pub use hubspot::HubSpotClient;
pub use mailchimp::MailchimpClient;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;

use crate::domain::ListId;
use crate::domain::SubscriberEmail;
use crate::utils::error_chain_fmt;

/// Rejection bodies are only kept for the logs; anything past this is dropped
/// without being read.
const MAX_ERROR_BODY_LEN: usize = 1024;

/// The supported providers. Also the accepted values of
/// `SELECTED_SERVICE_PROVIDER`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Mailchimp,
    HubSpot,
    ConvertKit,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Mailchimp => "mailchimp",
            ProviderKind::HubSpot => "hubspot",
            ProviderKind::ConvertKit => "convert_kit",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for ProviderKind {
    type Error = ConfigurationError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "mailchimp" => Ok(Self::Mailchimp),
            "hubspot" => Ok(Self::HubSpot),
            "convert_kit" => Ok(Self::ConvertKit),
            _ => Err(ConfigurationError::UnknownProvider(value)),
        }
    }
}

/// Anything that went wrong while talking to the remote provider. Carries
/// enough to diagnose the failure from logs; none of it is meant for the
/// client.
#[derive(thiserror::Error)]
pub enum SubscriptionError {
    #[error("{provider} rejected the subscription ({status}): {body}")]
    Rejected {
        provider: ProviderKind,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to reach {provider}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },
}

impl Debug for SubscriptionError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// The provider chosen at startup. Built once by `build_provider`, then
/// shared read-only by all requests.
///
/// The set of providers is closed, so this is a plain enum rather than a
/// trait object.
#[derive(Debug)]
pub enum NewsletterProvider {
    Mailchimp(MailchimpClient),
    HubSpot(HubSpotClient),
    ConvertKit(ConvertKitClient),
}

impl NewsletterProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            NewsletterProvider::Mailchimp(_) => ProviderKind::Mailchimp,
            NewsletterProvider::HubSpot(_) => ProviderKind::HubSpot,
            NewsletterProvider::ConvertKit(_) => ProviderKind::ConvertKit,
        }
    }

    /// Subscribe `email` to `list`, or to the provider's default list if
    /// `list` is `None`. Exactly one request is made; nothing is retried.
    pub async fn subscribe(
        &self,
        email: &SubscriberEmail,
        list: Option<&ListId>,
    ) -> Result<(), SubscriptionError> {
        match self {
            NewsletterProvider::Mailchimp(client) => client.subscribe(email, list).await,
            NewsletterProvider::HubSpot(client) => client.subscribe(email, list).await,
            NewsletterProvider::ConvertKit(client) => client.subscribe(email, list).await,
        }
    }
}

/// Send a prepared request, and normalise the outcome: only 2xx is a success.
/// The response body of a rejection is kept for the logs.
async fn send(
    provider: ProviderKind,
    request: RequestBuilder,
) -> Result<(), SubscriptionError> {
    let resp = request
        .send()
        .await
        .map_err(|source| SubscriptionError::Transport { provider, source })?;

    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }

    let body = match read_error_body(resp).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(%provider, %status, error = %e, "could not read provider error body");
            String::new()
        }
    };
    tracing::warn!(%provider, %status, "newsletter provider returned an error");
    Err(SubscriptionError::Rejected {
        provider,
        status,
        body,
    })
}

/// Read at most `MAX_ERROR_BODY_LEN` bytes of the body
async fn read_error_body(mut resp: Response) -> Result<String, reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = MAX_ERROR_BODY_LEN - buf.len();
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if buf.len() == MAX_ERROR_BODY_LEN {
            break;
        }
    }
    // a multi-byte char may have been cut in half
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
