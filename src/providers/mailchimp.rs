use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Serialize;

use super::send;
use super::ProviderKind;
use super::SubscriptionError;
use crate::domain::ListId;
use crate::domain::SubscriberEmail;

/// Mailchimp Marketing API, "add list member"
///
/// https://mailchimp.com/developer/marketing/api/list-members/add-member-to-list/
#[derive(Debug)]
pub struct MailchimpClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
    default_list: ListId,
}

#[derive(Serialize)]
struct AddListMember<'a> {
    email_address: &'a str,
    status: &'a str,
}

impl MailchimpClient {
    pub fn new(
        http_client: Client,
        base_url: String,
        api_key: Secret<String>,
        default_list: ListId,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            default_list,
        }
    }

    /// Each Mailchimp account lives in one data center (`us6` etc), which is
    /// part of the API host.
    pub fn default_base_url(server: &str) -> String {
        format!("https://{server}.api.mailchimp.com/3.0")
    }

    #[tracing::instrument(
        name = "Adding Mailchimp list member",
        skip_all,
        fields(list = tracing::field::Empty)
    )]
    pub async fn subscribe(
        &self,
        email: &SubscriberEmail,
        list: Option<&ListId>,
    ) -> Result<(), SubscriptionError> {
        let list = list.unwrap_or(&self.default_list);
        tracing::Span::current().record("list", tracing::field::display(list));

        let url = format!("{}/lists/{list}/members", self.base_url);
        let body = AddListMember {
            email_address: email.as_ref(),
            status: "subscribed",
        };
        let request = self
            .http_client
            .post(&url)
            // mailchimp ignores the username
            .basic_auth("anystring", Some(self.api_key.expose_secret()))
            .json(&body);

        send(ProviderKind::Mailchimp, request).await
    }
}
