use std::fmt::Display;

/// Identifier of a provider-side mailing list (a Mailchimp audience id, a
/// ConvertKit form id).
///
/// Never empty: both the configured defaults and user-supplied lists go
/// through `ListId::parse`. List ids end up as a URL path segment, so only
/// ASCII letters, digits, `-` and `_` are accepted; anything else (`/`, `..`,
/// `%2e`, `\`, `?`) could point an authenticated call at another endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListId(String);

impl ListId {
    pub fn parse(id: String) -> Result<Self, String> {
        let id = id.trim();
        let empty = id.is_empty();
        let bad = id
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        match !empty && !bad {
            true => Ok(Self(id.to_string())),
            false => Err(format!("Invalid list id: {id:?}")),
        }
    }
}

impl AsRef<str> for ListId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl Display for ListId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
