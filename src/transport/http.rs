use super::{connection_error, RawResponse, Transport};
use crate::config::TransportConfig;
use crate::drivers::DriverRequest;
use crate::error_code::ErrorKind;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Proxy;
use std::time::Duration;
use tracing::warn;

/// `reqwest`-backed transport.
///
/// - connect timeout applies to every call
/// - non-streamed calls get a whole-request timeout
/// - streamed calls wait at most the read timeout for response headers, then get an idle
///   timeout per body chunk, so long generations are not cut
/// - at most one retry, only when the request never reached the vendor (connect failure) or the
///   vendor answered 502/503/504
pub struct HttpTransport {
    client: reqwest::Client,
    config: TransportConfig,
}

/// Why one attempt produced no response.
#[derive(Debug)]
enum AttemptError {
    Http(reqwest::Error),
    /// Streamed call: no response headers within the limit.
    HeaderTimeout(Duration),
}

impl AttemptError {
    /// Only failures where the request cannot have been delivered are retried.
    fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Http(e) => e.is_connect(),
            AttemptError::HeaderTimeout(_) => false,
        }
    }

    fn into_error(self) -> Error {
        match self {
            AttemptError::Http(e) => connection_error(e),
            AttemptError::HeaderTimeout(limit) => Error::with_context(
                ErrorKind::ConnectionError,
                format!("no response headers within {}s", limit.as_secs()),
                ErrorContext::new()
                    .with_details("timeout")
                    .with_source("http_transport"),
            ),
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptError::Http(e) => write!(f, "{}", e),
            AttemptError::HeaderTimeout(limit) => {
                write!(f, "no response headers within {}s", limit.as_secs())
            }
        }
    }
}

impl HttpTransport {
    pub fn new(mut config: TransportConfig) -> Result<Self> {
        if config.max_retries > 1 {
            warn!(
                max_retries = config.max_retries,
                "only one automatic retry is supported; clamping"
            );
            config.max_retries = 1;
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = config.proxy_url.as_deref() {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::bad_request(format!("invalid proxy url '{}': {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(connection_error)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn send_once(
        &self,
        request: &DriverRequest,
    ) -> std::result::Result<reqwest::Response, AttemptError> {
        let mut req = self.client.post(&request.url).json(&request.body);

        for (k, v) in &request.headers {
            req = req.header(k, v);
        }

        if !request.stream {
            return req
                .timeout(self.config.request_timeout())
                .send()
                .await
                .map_err(AttemptError::Http);
        }

        // Body chunks get their own idle timeout in the line decoder; only the header wait here.
        let limit = self.config.read_timeout();
        let req = req.header("accept", "text/event-stream");
        match tokio::time::timeout(limit, req.send()).await {
            Ok(result) => result.map_err(AttemptError::Http),
            Err(_) => Err(AttemptError::HeaderTimeout(limit)),
        }
    }
}

/// Statuses worth a second attempt: gateway/proxy hiccups in front of the vendor.
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 502 | 503 | 504)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &DriverRequest) -> Result<RawResponse> {
        let mut attempt: u32 = 0;

        loop {
            match self.send_once(request).await {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if is_retryable_status(status) && attempt < self.config.max_retries {
                        warn!(
                            http_status = status,
                            attempt,
                            url = request.url.as_str(),
                            "retrying vendor call"
                        );
                        drop(resp);
                        attempt += 1;
                        tokio::time::sleep(self.config.retry_delay()).await;
                        continue;
                    }

                    if !request.stream || !resp.status().is_success() {
                        let body = resp.bytes().await.map_err(connection_error)?;
                        return Ok(RawResponse::complete(status, body));
                    }

                    let chunks = Box::pin(resp.bytes_stream().map_err(connection_error));
                    let lines =
                        crate::pipeline::decode::lines(chunks, Some(self.config.read_timeout()));
                    return Ok(RawResponse::lines(status, lines));
                }
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    warn!(
                        error = %e,
                        attempt,
                        url = request.url.as_str(),
                        "retrying vendor call after transport failure"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_delay()).await;
                }
                Err(e) => return Err(e.into_error()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(500));
        assert!(!is_retryable_status(429));
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let cfg = TransportConfig {
            proxy_url: Some("::not a proxy::".into()),
            ..TransportConfig::default()
        };
        assert!(HttpTransport::new(cfg).is_err());
    }

    #[test]
    fn test_max_retries_clamped_to_one() {
        let cfg = TransportConfig {
            max_retries: 5,
            ..TransportConfig::default()
        };
        let transport = HttpTransport::new(cfg).unwrap();
        assert_eq!(transport.config().max_retries, 1);
    }

    #[test]
    fn test_header_timeout_is_connection_error_and_final() {
        let err = AttemptError::HeaderTimeout(Duration::from_secs(300));
        assert!(!err.is_retryable());
        let err = err.into_error();
        assert_eq!(err.kind(), ErrorKind::ConnectionError);
        assert_eq!(err.context().details.as_deref(), Some("timeout"));
    }
}
