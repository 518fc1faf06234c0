//! 流式解码模块：把原始行流转换为统一消息流。
//!
//! # Streaming Decode Layer
//!
//! ```text
//! HTTP body → decode::lines → decode_stream(driver) → Message stream
//!   bytes       framing         envelope semantics     caller
//! ```
//!
//! [`decode::lines`] only cuts bytes into lines. [`decode_stream`] strips the optional SSE
//! `data: ` framing and hands each payload to the provider driver, which decides whether it is
//! a set of deltas, the final aggregated message, or a vendor error.
//!
//! Stream contract:
//! - finite and non-restartable, bound to the lifetime of the connection
//! - a vendor error is yielded once, then the stream ends
//! - the final message ends the stream and the line source is dropped at once, so trailing
//!   lines are never read and the connection is released
//! - dropping the stream early drops the line source (and the connection) with it

pub mod decode;

use crate::drivers::{ProviderDriver, StreamStep};
use crate::transport::LineStream;
use crate::types::message::{Message, MessageBuilder, MessageRole};
use crate::{BoxStream, Result};
use futures::{stream, StreamExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lazy sequence of uniform messages.
pub type MessageStream = BoxStream<'static, Message>;

const DATA_PREFIX: &str = "data:";
const DONE_SIGNAL: &str = "[DONE]";

struct DecodeState {
    driver: Arc<dyn ProviderDriver>,
    lines: Option<LineStream>,
    pending: VecDeque<Message>,
}

/// Decode a streamed vendor response into uniform messages.
pub fn decode_stream(driver: Arc<dyn ProviderDriver>, lines: LineStream) -> MessageStream {
    let state = DecodeState {
        driver,
        lines: Some(lines),
        pending: VecDeque::new(),
    };

    let stream = stream::unfold(state, |mut st| async move {
        loop {
            if let Some(msg) = st.pending.pop_front() {
                return Some((Ok(msg), st));
            }

            let next = st.lines.as_mut()?.next().await;
            let line = match next {
                None => {
                    st.lines = None;
                    return None;
                }
                Some(Err(e)) => {
                    warn!(error_kind = e.kind().name(), "stream aborted by transport failure");
                    st.lines = None;
                    return Some((Err(e), st));
                }
                Some(Ok(line)) => line,
            };

            let payload = strip_framing(&line);
            if payload.is_empty() || payload.starts_with(':') {
                continue;
            }
            if payload == DONE_SIGNAL {
                st.lines = None;
                return None;
            }

            match st.driver.parse_stream_line(payload) {
                Ok(StreamStep::Deltas(deltas)) => {
                    if deltas.is_empty() {
                        debug!(
                            provider = st.driver.provider_id(),
                            "stream envelope without content"
                        );
                    }
                    st.pending.extend(deltas);
                }
                Ok(StreamStep::Final(msg)) => {
                    st.lines = None;
                    return Some((Ok(msg), st));
                }
                Err(e) => {
                    warn!(
                        provider = st.driver.provider_id(),
                        error_kind = e.kind().name(),
                        vendor_code = e.context().vendor_code,
                        "vendor error inside stream"
                    );
                    st.lines = None;
                    return Some((Err(e), st));
                }
            }
        }
    });

    Box::pin(stream)
}

/// Drain a message stream into one assistant message.
///
/// Delta contents are concatenated; usage and stop reason are taken from the last message that
/// carries them.
pub async fn collect_stream(mut stream: MessageStream) -> Result<Message> {
    let mut content = String::new();
    let mut usage = None;
    let mut stop_reason = None;

    while let Some(item) = stream.next().await {
        let msg = item?;
        content.push_str(msg.content());
        if let Some(u) = msg.usage() {
            usage = Some(*u);
        }
        if let Some(r) = msg.stop_reason() {
            stop_reason = Some(r.to_string());
        }
    }

    let mut builder = MessageBuilder::new(MessageRole::Assistant)
        .content(content)
        .stop_reason(stop_reason);
    if let Some(u) = usage {
        builder = builder.usage(u);
    }
    Ok(builder.build())
}

fn strip_framing(line: &str) -> &str {
    let trimmed = line.trim();
    match trimmed.strip_prefix(DATA_PREFIX) {
        Some(rest) => rest.trim_start(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_framing() {
        assert_eq!(strip_framing("data: {\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_framing("data:{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_framing("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_framing("data: "), "");
    }

    #[test]
    fn test_collect_keeps_last_usage() {
        let items = vec![
            Ok(Message::assistant("a")),
            Ok(Message::assistant("b")),
            Ok(MessageBuilder::new(MessageRole::Assistant)
                .usage(crate::types::message::Usage {
                    prompt_tokens: 0,
                    completion_tokens: 4,
                    total_tokens: 4,
                })
                .stop_reason(Some("stop".into()))
                .build()),
        ];
        let msg = tokio_test::block_on(collect_stream(Box::pin(stream::iter(items)))).unwrap();
        assert_eq!(msg.content(), "ab");
        assert_eq!(msg.usage().map(|u| u.total_tokens), Some(4));
        assert_eq!(msg.stop_reason(), Some("stop"));
    }

    #[test]
    fn test_collect_propagates_error() {
        let items = vec![
            Ok(Message::assistant("a")),
            Err(crate::Error::connection("reset")),
        ];
        let err = tokio_test::block_on(collect_stream(Box::pin(stream::iter(items)))).unwrap_err();
        assert_eq!(err.kind(), crate::error_code::ErrorKind::ConnectionError);
    }
}
