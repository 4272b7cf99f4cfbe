use super::ListId;
use super::SubscriberEmail;

/// A request to subscribe, after parsing. `list` is `None` when the caller
/// didn't name one; the provider then falls back to its configured default.
#[derive(Debug)]
pub struct NewSubscription {
    pub email: SubscriberEmail,
    pub list: Option<ListId>,
}
