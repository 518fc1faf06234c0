//! Shared fixtures for integration tests: a scripted transport, a mockito server wrapper and
//! MiniMax envelope builders.
#![allow(dead_code)]

use ai_gateway::config::{GatewayConfig, MinimaxConfig, TransportConfig};
use ai_gateway::drivers::DriverRequest;
use ai_gateway::transport::{LineStream, RawResponse, Transport};
use ai_gateway::{Error, Gateway, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use mockito::{Server, ServerGuard};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const MODEL: &str = "abab5.5-chat";
pub const API_KEY: &str = "sk-test";
pub const GROUP_ID: &str = "1780000000";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Observes how far a scripted line source was read and whether it was released.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    closed: Arc<AtomicBool>,
    pulled: Arc<AtomicUsize>,
}

impl ConnectionTracker {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn lines_pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }
}

struct CloseGuard(Arc<AtomicBool>);

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Line source that records every pull and flags itself closed when dropped.
///
/// With `keep_open` the source never ends after the scripted lines, like a connection the
/// vendor has not closed yet.
pub fn tracked_lines(lines: Vec<String>, keep_open: bool) -> (LineStream, ConnectionTracker) {
    let tracker = ConnectionTracker::default();
    let guard = CloseGuard(tracker.closed.clone());
    let pulled = tracker.pulled.clone();

    let tail: BoxStream<'static, String> = if keep_open {
        stream::pending().boxed()
    } else {
        stream::empty().boxed()
    };

    let lines = stream::iter(lines).chain(tail).map(move |line| {
        let _open = &guard;
        pulled.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Error>(line)
    });

    (Box::pin(lines), tracker)
}

/// Transport that replays scripted responses and records what it was asked to send.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<DriverRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: RawResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push(RawResponse::complete(status, body.to_string()));
    }

    /// Script a streamed response and return its tracker.
    pub fn push_lines(&self, lines: Vec<String>, keep_open: bool) -> ConnectionTracker {
        let (lines, tracker) = tracked_lines(lines, keep_open);
        self.push(RawResponse::lines(200, lines));
        tracker
    }

    pub fn requests(&self) -> Vec<DriverRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> DriverRequest {
        self.requests()
            .pop()
            .expect("transport was never called")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &DriverRequest) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::connection("no scripted response left"))
    }
}

pub fn gateway_with(transport: Arc<MockTransport>) -> Gateway {
    Gateway::builder()
        .transport(transport)
        .build()
        .expect("gateway")
}

/// Test fixture that manages a mock HTTP server.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Gateway pointed at the mock server with a short retry delay.
    pub fn gateway(&self) -> Gateway {
        gateway_for_base_url(&self.base_url)
    }
}

pub fn gateway_for_base_url(base_url: &str) -> Gateway {
    let config = GatewayConfig {
        transport: TransportConfig {
            retry_delay_ms: 10,
            ..TransportConfig::default()
        },
        minimax: MinimaxConfig::default().with_base_url(base_url),
    };
    Gateway::builder().config(config).build().expect("gateway")
}

/// Streamed envelope carrying one content delta.
pub fn delta_line(text: &str) -> String {
    format!(
        "data: {}",
        json!({
            "created": 1700000000,
            "model": MODEL,
            "reply": "",
            "choices": [{"messages": [{"sender_type": "BOT", "sender_name": "专家", "text": text}]}],
            "output_sensitive": false
        })
    )
}

/// Closing envelope with the full reply and usage.
pub fn final_line(reply: &str, total_tokens: u64) -> String {
    format!(
        "data: {}",
        json!({
            "created": 1700000000,
            "model": MODEL,
            "reply": reply,
            "choices": [{
                "finish_reason": "stop",
                "messages": [{"sender_type": "BOT", "sender_name": "专家", "text": reply}]
            }],
            "usage": {"total_tokens": total_tokens},
            "base_resp": {"status_code": 0, "status_msg": "success"}
        })
    )
}

pub fn error_envelope(code: i64, msg: &str) -> serde_json::Value {
    json!({"base_resp": {"status_code": code, "status_msg": msg}})
}

pub fn error_line(code: i64, msg: &str) -> String {
    format!("data: {}", error_envelope(code, msg))
}

/// Complete (non-streamed) success body.
pub fn completion_body(reply: &str, total_tokens: u64) -> serde_json::Value {
    json!({
        "created": 1700000000,
        "model": MODEL,
        "reply": reply,
        "choices": [{
            "finish_reason": "stop",
            "messages": [{"sender_type": "BOT", "sender_name": "专家", "text": reply}]
        }],
        "usage": {"total_tokens": total_tokens},
        "input_sensitive": false,
        "output_sensitive": false,
        "base_resp": {"status_code": 0, "status_msg": ""}
    })
}
