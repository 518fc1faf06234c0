//! Gateway configuration
//!
//! Settings are plain serde structures so they can be embedded in an application's own config
//! file. Every field has a production default; `from_env` layers environment overrides on top.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default MiniMax API origin.
pub const MINIMAX_DEFAULT_BASE_URL: &str = "https://api.minimax.chat";

/// HTTP transport settings shared by all provider adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    /// Upper bound for a whole non-streamed call
    pub request_timeout_secs: u64,
    /// Longest silence tolerated between two chunks of a streamed body
    pub read_timeout_secs: u64,
    /// Automatic retries before any response bytes were handed out (0 or 1; the HTTP transport clamps larger values to 1)
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 315,
            read_timeout_secs: 300,
            max_retries: 1,
            retry_delay_ms: 500,
            proxy_url: None,
        }
    }
}

impl TransportConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse::<u64>("AI_GATEWAY_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = env_parse::<u64>("AI_GATEWAY_TIMEOUT_SECS") {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_parse::<u64>("AI_GATEWAY_READ_TIMEOUT_SECS") {
            self.read_timeout_secs = v;
        }
        if let Some(v) = env_parse::<u32>("AI_GATEWAY_MAX_RETRIES") {
            self.max_retries = v;
        }
        if let Ok(proxy) = env::var("AI_GATEWAY_PROXY_URL") {
            if !proxy.trim().is_empty() {
                self.proxy_url = Some(proxy);
            }
        }
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// MiniMax adapter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimaxConfig {
    pub base_url: String,
    /// Name the bot speaks as, used in `bot_setting` and `reply_constraints`
    pub bot_name: String,
    /// Persona text used when the conversation carries no system message
    pub default_persona: String,
    pub models: Vec<String>,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            base_url: MINIMAX_DEFAULT_BASE_URL.to_string(),
            bot_name: "专家".to_string(),
            default_persona: "你是一个什么都懂的专家".to_string(),
            models: vec![
                "abab5.5-chat".to_string(),
                "abab5.5s-chat".to_string(),
                "abab6-chat".to_string(),
                "abab6.5-chat".to_string(),
                "abab6.5s-chat".to_string(),
            ],
        }
    }
}

impl MinimaxConfig {
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(base) = env::var("MINIMAX_BASE_URL") {
            if !base.trim().is_empty() {
                self.base_url = base;
            }
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|e| {
            Error::bad_request(format!("invalid MiniMax base_url '{}': {}", self.base_url, e))
        })?;
        if self.models.is_empty() {
            return Err(Error::bad_request("MiniMax model list must not be empty"));
        }
        Ok(())
    }
}

/// Top-level gateway configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub transport: TransportConfig,
    pub minimax: MinimaxConfig,
}

impl GatewayConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let cfg: GatewayConfig = serde_yaml::from_str(raw)
            .map_err(|e| Error::bad_request(format!("invalid gateway config: {}", e)))?;
        cfg.minimax.validate()?;
        Ok(cfg)
    }

    pub fn from_env() -> Self {
        Self {
            transport: TransportConfig::from_env(),
            minimax: MinimaxConfig::default().with_env_overrides(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = TransportConfig::default();
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.read_timeout(), Duration::from_secs(300));
        assert_eq!(cfg.max_retries, 1);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = GatewayConfig::from_yaml_str(
            "transport:\n  max_retries: 0\nminimax:\n  base_url: http://127.0.0.1:9000\n",
        )
        .unwrap();
        assert_eq!(cfg.transport.max_retries, 0);
        assert_eq!(cfg.transport.connect_timeout_secs, 5);
        assert_eq!(cfg.minimax.base_url, "http://127.0.0.1:9000");
        assert!(cfg.minimax.models.iter().any(|m| m == "abab5.5-chat"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = GatewayConfig::from_yaml_str("minimax:\n  base_url: not a url\n").unwrap_err();
        assert!(err.message().contains("base_url"));
    }
}
