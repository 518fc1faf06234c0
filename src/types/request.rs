//! Provider-agnostic chat request.

use super::message::Message;
use super::params::GenerationParameters;
use std::fmt;

/// Per-call vendor credentials.
///
/// `account_id` is the vendor's account/group identifier that is templated into the endpoint URL.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub account_id: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            account_id: account_id.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.account_id.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Everything a driver needs to build one vendor call.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Registry key of the provider adapter (e.g. `"minimax"`)
    pub provider: String,
    pub model: String,
    pub credentials: Credentials,
    pub messages: Vec<Message>,
    pub parameters: GenerationParameters,
    pub stop: Option<Vec<String>>,
    pub stream: bool,
    /// Caller identity, used for log correlation only
    pub user: Option<String>,
}

impl ChatRequest {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let creds = Credentials::new("sk-secret", "group-1");
        let text = format!("{:?}", creds);
        assert!(!text.contains("sk-secret"));
        assert!(text.contains("group-1"));
    }

    #[test]
    fn test_blank_credentials_are_incomplete() {
        assert!(!Credentials::new("  ", "g").is_complete());
        assert!(!Credentials::new("k", "").is_complete());
        assert!(Credentials::new("k", "g").is_complete());
    }
}
