use std::fmt::Debug;

use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;

use super::convert_kit;
use super::hubspot;
use super::ConvertKitClient;
use super::HubSpotClient;
use super::MailchimpClient;
use super::NewsletterProvider;
use super::ProviderKind;
use crate::configuration::ListSettings;
use crate::configuration::NewsletterSettings;
use crate::domain::ListId;
use crate::utils::error_chain_fmt;

/// Invalid provider configuration. Always fatal: the server must not start
/// without a usable provider.
#[derive(thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid newsletter service provider configuration: {0:?}")]
    UnknownProvider(String),
    #[error("Missing `{setting}` for the {provider} newsletter provider")]
    MissingSetting {
        provider: ProviderKind,
        setting: &'static str,
    },
    #[error("Invalid `{setting}` for the {provider} newsletter provider: {reason}")]
    InvalidSetting {
        provider: ProviderKind,
        setting: &'static str,
        reason: String,
    },
    #[error("Failed to build the HTTP client for newsletter providers")]
    HttpClient(#[source] reqwest::Error),
}

impl Debug for ConfigurationError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Construct the one provider this process will use, as selected by
/// `selected_service_provider`.
///
/// Only the selected provider's section is read; the others may be absent.
/// There is no fallback: any problem is returned as a `ConfigurationError`.
pub fn build_provider(
    settings: &NewsletterSettings,
) -> Result<NewsletterProvider, ConfigurationError> {
    let kind = ProviderKind::try_from(settings.selected_service_provider.clone())?;

    // one client (connection pool) shared by all requests
    let http_client = Client::builder()
        .timeout(settings.timeout())
        .build()
        .map_err(ConfigurationError::HttpClient)?;

    let provider = match kind {
        ProviderKind::Mailchimp => {
            let cfg = settings
                .mailchimp
                .as_ref()
                .ok_or_else(|| missing(kind, "mailchimp"))?;
            let base_url = match &cfg.base_url {
                Some(url) => url.clone(),
                None => {
                    if cfg.server.trim().is_empty() {
                        return Err(missing(kind, "server"));
                    }
                    MailchimpClient::default_base_url(cfg.server.trim())
                }
            };
            NewsletterProvider::Mailchimp(MailchimpClient::new(
                http_client,
                base_url,
                required_secret(kind, "key", &cfg.key)?,
                default_list(kind, &cfg.lists)?,
            ))
        }
        ProviderKind::HubSpot => {
            let cfg = settings
                .hubspot
                .as_ref()
                .ok_or_else(|| missing(kind, "hubspot"))?;
            NewsletterProvider::HubSpot(HubSpotClient::new(
                http_client,
                cfg.base_url
                    .clone()
                    .unwrap_or_else(|| hubspot::DEFAULT_BASE_URL.to_string()),
                required_secret(kind, "key", &cfg.key)?,
            ))
        }
        ProviderKind::ConvertKit => {
            let cfg = settings
                .convert_kit
                .as_ref()
                .ok_or_else(|| missing(kind, "convert_kit"))?;
            NewsletterProvider::ConvertKit(ConvertKitClient::new(
                http_client,
                cfg.base_url
                    .clone()
                    .unwrap_or_else(|| convert_kit::DEFAULT_BASE_URL.to_string()),
                required_secret(kind, "api_secret", &cfg.api_secret)?,
                default_list(kind, &cfg.lists)?,
            ))
        }
    };

    Ok(provider)
}

fn missing(
    provider: ProviderKind,
    setting: &'static str,
) -> ConfigurationError {
    ConfigurationError::MissingSetting { provider, setting }
}

fn required_secret(
    provider: ProviderKind,
    setting: &'static str,
    secret: &Secret<String>,
) -> Result<Secret<String>, ConfigurationError> {
    match secret.expose_secret().trim().is_empty() {
        true => Err(missing(provider, setting)),
        false => Ok(secret.clone()),
    }
}

fn default_list(
    provider: ProviderKind,
    lists: &ListSettings,
) -> Result<ListId, ConfigurationError> {
    if lists.subscribers.trim().is_empty() {
        return Err(missing(provider, "lists.subscribers"));
    }
    ListId::parse(lists.subscribers.clone()).map_err(|reason| {
        ConfigurationError::InvalidSetting {
            provider,
            setting: "lists.subscribers",
            reason,
        }
    })
}
