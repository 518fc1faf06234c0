//! 传输层：执行 HTTP 调用并把原始响应交给解码器。
//!
//! Transport layer.
//!
//! A [`Transport`] performs exactly one logical vendor call and hands back the raw response,
//! either fully buffered or as a line stream. It never interprets vendor payloads; success or
//! failure of the *vendor* call is decided by the driver that owns the request.

pub mod http;

pub use http::HttpTransport;

use crate::drivers::DriverRequest;
use crate::{BoxStream, Error, Result};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;

/// Lines of a streamed response body, in arrival order, without line terminators.
pub type LineStream = BoxStream<'static, String>;

/// Raw response body as produced by a transport.
pub enum RawBody {
    /// Fully read body (non-streamed calls and every non-2xx response)
    Complete(Bytes),
    /// Live body of a streamed call; dropping it closes the connection
    Lines(LineStream),
}

impl RawBody {
    /// View the body as a line stream, splitting a buffered body if necessary.
    pub fn into_lines(self) -> LineStream {
        match self {
            RawBody::Lines(lines) => lines,
            RawBody::Complete(bytes) => crate::pipeline::decode::lines_from_bytes(bytes),
        }
    }

    /// Read the whole body, joining streamed lines with `\n`.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self {
            RawBody::Complete(bytes) => Ok(bytes),
            RawBody::Lines(mut lines) => {
                let mut buf = BytesMut::new();
                while let Some(line) = lines.next().await {
                    if !buf.is_empty() {
                        buf.extend_from_slice(b"\n");
                    }
                    buf.extend_from_slice(line?.as_bytes());
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl std::fmt::Debug for RawBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawBody::Complete(bytes) => f.debug_tuple("Complete").field(&bytes.len()).finish(),
            RawBody::Lines(_) => f.write_str("Lines(..)"),
        }
    }
}

/// HTTP status plus raw body.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: RawBody,
}

impl RawResponse {
    pub fn complete(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: RawBody::Complete(body.into()),
        }
    }

    pub fn lines(status: u16, lines: LineStream) -> Self {
        Self {
            status,
            body: RawBody::Lines(lines),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one vendor call.
///
/// Implementations report transport-level failures (DNS, connect, timeout, body read) as
/// [`Error::ConnectionError`] and return any HTTP status, 2xx or not, as a [`RawResponse`].
/// Automatic retries, if any, happen here and only before a response is returned.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &DriverRequest) -> Result<RawResponse>;
}

/// Map a `reqwest` failure into the uniform taxonomy.
pub(crate) fn connection_error(e: reqwest::Error) -> Error {
    let details = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_body() || e.is_decode() {
        "body"
    } else {
        "request"
    };
    Error::with_context(
        crate::error_code::ErrorKind::ConnectionError,
        e.to_string(),
        crate::ErrorContext::new()
            .with_details(details)
            .with_source("http_transport"),
    )
}
