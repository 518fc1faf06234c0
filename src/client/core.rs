use crate::drivers::ProviderDriver;
use crate::pipeline::{collect_stream, decode_stream, MessageStream};
use crate::registry::DriverRegistry;
use crate::transport::Transport;
use crate::types::message::Message;
use crate::types::request::ChatRequest;
use crate::Result;
use futures::{stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Header carrying the gateway's per-call correlation id.
pub const REQUEST_ID_HEADER: &str = "x-gateway-request-id";

/// Provider-agnostic entry point.
///
/// Holds no per-call state; one instance can serve concurrent calls.
pub struct Gateway {
    pub(crate) registry: DriverRegistry,
    pub(crate) transport: Arc<dyn Transport>,
}

/// Result of [`Gateway::invoke`].
pub enum ChatResponse {
    Complete(Message),
    Stream(MessageStream),
}

impl ChatResponse {
    pub fn is_stream(&self) -> bool {
        matches!(self, ChatResponse::Stream(_))
    }

    /// Aggregate into a single message, draining the stream if there is one.
    pub async fn collect(self) -> Result<Message> {
        match self {
            ChatResponse::Complete(msg) => Ok(msg),
            ChatResponse::Stream(s) => collect_stream(s).await,
        }
    }

    /// View as a stream; a complete response becomes a one-item stream.
    pub fn into_stream(self) -> MessageStream {
        match self {
            ChatResponse::Complete(msg) => {
                Box::pin(stream::once(async move { Ok::<_, crate::Error>(msg) }))
            }
            ChatResponse::Stream(s) => s,
        }
    }
}

impl std::fmt::Debug for ChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatResponse::Complete(msg) => f.debug_tuple("Complete").field(msg).finish(),
            ChatResponse::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl Gateway {
    /// Gateway with default configuration and the built-in drivers.
    pub fn new() -> Result<Self> {
        crate::client::builder::GatewayBuilder::new().build()
    }

    pub fn builder() -> crate::client::builder::GatewayBuilder {
        crate::client::builder::GatewayBuilder::new()
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// Create a chat request builder for `provider` / `model`.
    pub fn chat(
        &self,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> crate::client::chat::ChatRequestBuilder<'_> {
        crate::client::chat::ChatRequestBuilder::new(self, ChatRequest::new(provider, model))
    }

    /// Run one call: build, send, decode.
    ///
    /// Every error returned here or yielded by the stream carries the call's request id.
    pub async fn invoke(&self, request: ChatRequest) -> Result<ChatResponse> {
        let request_id = Uuid::new_v4().to_string();
        let tag = |e: crate::Error| e.with_request_id(&request_id);

        let driver = self.registry.get(&request.provider).map_err(tag)?;
        let driver_req = driver
            .build_request(&request)
            .map_err(tag)?
            .with_header(REQUEST_ID_HEADER, request_id.as_str());

        info!(
            request_id = request_id.as_str(),
            provider = driver.provider_id(),
            model = request.model.as_str(),
            stream = request.stream,
            user = request.user.as_deref().unwrap_or(""),
            messages = request.messages.len(),
            "vendor call started"
        );
        let started = Instant::now();

        let body = match driver.send(self.transport.as_ref(), &driver_req).await {
            Ok(body) => body,
            Err(e) => {
                let e = tag(e);
                warn!(
                    request_id = request_id.as_str(),
                    provider = driver.provider_id(),
                    error_kind = e.kind().name(),
                    http_status = e.context().http_status,
                    vendor_code = e.context().vendor_code,
                    "vendor call failed"
                );
                return Err(e);
            }
        };

        if request.stream {
            info!(
                request_id = request_id.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "vendor stream opened"
            );
            return Ok(ChatResponse::Stream(tagged_stream(
                decode_stream(driver, body.into_lines()),
                request_id.clone(),
            )));
        }

        let bytes = body.into_bytes().await.map_err(tag)?;
        match driver.parse_response(&bytes) {
            Ok(msg) => {
                info!(
                    request_id = request_id.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    total_tokens = msg.usage().map(|u| u.total_tokens).unwrap_or(0),
                    stop_reason = msg.stop_reason().unwrap_or(""),
                    "vendor call finished"
                );
                Ok(ChatResponse::Complete(msg))
            }
            Err(e) => {
                let e = tag(e);
                warn!(
                    request_id = request_id.as_str(),
                    provider = driver.provider_id(),
                    error_kind = e.kind().name(),
                    vendor_code = e.context().vendor_code,
                    "vendor call failed"
                );
                Err(e)
            }
        }
    }

    /// Resolve the driver for `provider`.
    pub fn driver(&self, provider: &str) -> Result<Arc<dyn ProviderDriver>> {
        self.registry.get(provider)
    }
}

fn tagged_stream(inner: MessageStream, request_id: String) -> MessageStream {
    Box::pin(inner.map(move |item| item.map_err(|e| e.with_request_id(&request_id))))
}
