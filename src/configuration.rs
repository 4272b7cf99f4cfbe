use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

/// Flat env vars used by existing deployments, mapped onto their nested keys.
/// These are applied last, so they win over both the yaml files and `APP_*`
/// vars. When two vars map to the same key, the later one wins.
const DEPLOYMENT_ENV_VARS: &[(&str, &str)] = &[
    ("APP_NAME", "application.name"),
    (
        "SELECTED_SERVICE_PROVIDER",
        "newsletter.selected_service_provider",
    ),
    ("MAILCHIMP_KEY", "newsletter.mailchimp.key"),
    ("MAILCHIMP_SERVER", "newsletter.mailchimp.server"),
    (
        "MAILCHIMP_SUBSCRIBERS_LIST_ID",
        "newsletter.mailchimp.lists.subscribers",
    ),
    ("CONVERT_KIT_KEY", "newsletter.convert_kit.key"),
    ("CONVERT_KIT_SECRET", "newsletter.convert_kit.api_secret"),
    (
        "CONVERT_KIT_SUBSCRIBERS_LIST_ID",
        "newsletter.convert_kit.lists.subscribers",
    ),
    // older deployments spell it this way
    ("HubSpot_KEY", "newsletter.hubspot.key"),
    ("HUBSPOT_KEY", "newsletter.hubspot.key"),
];

/// Global configuration, loaded from `configuration/*.yaml` and the
/// environment. See `get_configuration`.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub newsletter: NewsletterSettings,
}

/// Server configuration
#[derive(Clone, Deserialize)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Only used in the welcome message at `/`
    pub name: String,
}

/// Which newsletter provider to use, and how to reach each of them.
///
/// Every provider section is optional here; only the section of the selected
/// provider must be present, which is checked when the provider is built
/// (`providers::build_provider`).
#[derive(Clone, Deserialize)]
pub struct NewsletterSettings {
    /// One of `mailchimp`, `hubspot`, `convert_kit`. Kept as a raw string so
    /// that an invalid value is reported as a provider configuration error
    /// rather than a generic deserialization error.
    pub selected_service_provider: String,

    /// Upper bound for a single outbound provider call
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,

    pub mailchimp: Option<MailchimpSettings>,
    pub hubspot: Option<HubSpotSettings>,
    pub convert_kit: Option<ConvertKitSettings>,
}

impl NewsletterSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }
}

#[derive(Clone, Deserialize)]
pub struct MailchimpSettings {
    pub key: Secret<String>,

    /// Data center prefix, e.g. `us6`. Determines the default `base_url`.
    pub server: String,

    pub lists: ListSettings,

    /// Overrides `https://{server}.api.mailchimp.com/3.0`
    pub base_url: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct HubSpotSettings {
    pub key: Secret<String>,

    /// Overrides `https://api.hubapi.com`
    pub base_url: Option<String>,
}

#[derive(Clone, Deserialize)]
pub struct ConvertKitSettings {
    /// Public API key. Not needed to subscribe (only `api_secret` is).
    pub key: Option<Secret<String>>,

    pub api_secret: Secret<String>,

    /// `subscribers` is a form id
    pub lists: ListSettings,

    /// Overrides `https://api.convertkit.com/v3`
    pub base_url: Option<String>,
}

/// Default list ids, used whenever a request doesn't name a list
#[derive(Clone, Deserialize)]
pub struct ListSettings {
    pub subscribers: String,
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// layer env vars on top.
///
/// Env vars come in two flavours:
///
/// - `APP_NEWSLETTER__TIMEOUT_MILLISECONDS=2000` -> `Settings.newsletter.timeout_milliseconds`
/// - the flat names in `DEPLOYMENT_ENV_VARS`, e.g. `SELECTED_SERVICE_PROVIDER=hubspot`
///
/// Missing required fields fail here. Whether the selected provider is known,
/// and whether its credentials are present, is only checked when the provider
/// is built.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Message(format!("could not get current dir: {e}")))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let builder = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- strings; numeric fields go through `serde-aux`
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        );

    with_deployment_overrides(builder, |var| env::var(var).ok())?
        .build()?
        .try_deserialize::<Settings>()
}

/// Apply `DEPLOYMENT_ENV_VARS`, looking each one up with `lookup`. Unset vars
/// leave the existing value alone.
fn with_deployment_overrides(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in DEPLOYMENT_ENV_VARS {
        builder = builder.set_override_option(*key, lookup(var))?;
    }
    Ok(builder)
}
