//! Provider 驱动抽象层：通过 trait 实现多厂商 API 适配的动态分发
//!
//! Provider driver abstraction layer.
//!
//! A driver owns everything vendor-specific: URL shape, auth header, body fields, response
//! envelopes and the vendor's error code table. The gateway only ever talks to
//! `Arc<dyn ProviderDriver>`, so adding a vendor means adding one driver and registering it.

pub mod minimax;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{Error, ErrorContext};
use crate::error_code::ErrorKind;
use crate::transport::{RawBody, Transport};
use crate::types::message::Message;
use crate::types::request::ChatRequest;
use crate::Result;

pub use minimax::MinimaxDriver;

/// Fully built vendor call. Immutable once returned by [`ProviderDriver::build_request`].
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRequest {
    /// Target URL, query string included.
    pub url: String,
    /// Request headers (auth, correlation id).
    pub headers: HashMap<String, String>,
    /// JSON request body.
    pub body: Value,
    /// Whether the vendor was asked to stream.
    pub stream: bool,
}

impl DriverRequest {
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Outcome of decoding one streamed envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamStep {
    /// Incremental content; may be empty when the envelope carried nothing to emit.
    Deltas(Vec<Message>),
    /// The aggregated closing message; the stream ends after it.
    Final(Message),
}

/// Core trait for provider-specific API adaptation.
///
/// The trait is object-safe; the registry hands out `Arc<dyn ProviderDriver>`.
#[async_trait]
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Registry key, e.g. `"minimax"`.
    fn provider_id(&self) -> &str;

    /// Model ids this driver accepts.
    fn supported_models(&self) -> &[String];

    fn supports_model(&self, model: &str) -> bool {
        self.supported_models().iter().any(|m| m == model)
    }

    /// Validate a uniform request and translate it into a vendor call.
    fn build_request(&self, request: &ChatRequest) -> Result<DriverRequest>;

    /// Decode a complete (non-streamed) response body.
    fn parse_response(&self, body: &[u8]) -> Result<Message>;

    /// Decode one streamed payload, SSE framing already stripped.
    fn parse_stream_line(&self, payload: &str) -> Result<StreamStep>;

    /// Map a vendor error code and message into the uniform taxonomy.
    fn classify_error(&self, code: i64, message: &str) -> Error;

    /// Extract a vendor error from an error response body, if it carries one.
    fn parse_error_envelope(&self, body: &[u8]) -> Option<Error>;

    /// Issue the call through `transport`.
    ///
    /// A 2xx response is handed back as-is. A non-2xx response is classified through
    /// [`ProviderDriver::parse_error_envelope`], falling back to `ServerUnavailable` with the raw
    /// body attached.
    async fn send(&self, transport: &dyn Transport, request: &DriverRequest) -> Result<RawBody> {
        let response = transport.send(request).await?;
        if response.is_success() {
            return Ok(response.body);
        }

        let status = response.status;
        debug!(
            http_status = status,
            hint = ErrorKind::from_http_status(status).name(),
            provider = self.provider_id(),
            "non-2xx vendor response"
        );
        let body = response.body.into_bytes().await?;
        let err = match self.parse_error_envelope(&body) {
            Some(err) => err.with_http_status(status),
            None => {
                let raw = String::from_utf8_lossy(&body).into_owned();
                Error::with_context(
                    ErrorKind::ServerUnavailable,
                    format!("HTTP {} from {}", status, self.provider_id()),
                    ErrorContext::new()
                        .with_http_status(status)
                        .with_details(raw)
                        .with_source(self.provider_id()),
                )
            }
        };
        Err(err)
    }
}
