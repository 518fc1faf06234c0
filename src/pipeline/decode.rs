//! Line framing (Bytes -> lines)
//!
//! Vendors stream line-delimited JSON, sometimes SSE-framed. This module only cuts the byte
//! stream into lines; payload interpretation belongs to the driver.

use crate::error_code::ErrorKind;
use crate::transport::LineStream;
use crate::{BoxStream, Error, ErrorContext, Result};
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::time::Duration;

/// Split a chunked body into lines.
///
/// - lines are split on `\n` and trimmed
/// - blank lines are skipped
/// - bytes are buffered until a full line is present, so multi-byte characters split across
///   chunks decode correctly
/// - with `idle_timeout`, a gap longer than the timeout between two chunks ends the stream
///   with a `ConnectionError`
/// - a line that is not valid UTF-8 ends the stream with an `Unknown` error
/// - the first error ends the stream
pub fn lines(input: BoxStream<'static, Bytes>, idle_timeout: Option<Duration>) -> LineStream {
    let stream = stream::unfold(
        Some((input, Vec::<u8>::new())),
        move |state| async move {
            let (mut input, mut buf) = state?;
            loop {
                if let Some(idx) = buf.iter().position(|b| *b == b'\n') {
                    let rest = buf.split_off(idx + 1);
                    let line = match decode_line(&buf) {
                        Ok(line) => line,
                        Err(e) => return Some((Err(e), None)),
                    };
                    buf = rest;
                    if line.is_empty() {
                        continue;
                    }
                    return Some((Ok(line), Some((input, buf))));
                }

                let next = match idle_timeout {
                    Some(limit) => match tokio::time::timeout(limit, input.next()).await {
                        Ok(v) => v,
                        Err(_) => {
                            let err = Error::with_context(
                                ErrorKind::ConnectionError,
                                format!("no data received for {}s", limit.as_secs()),
                                ErrorContext::new()
                                    .with_details("read timeout")
                                    .with_source("line_decoder"),
                            );
                            return Some((Err(err), None));
                        }
                    },
                    None => input.next().await,
                };

                match next {
                    Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                    Some(Err(e)) => return Some((Err(e), None)),
                    None => {
                        // EOF: flush an unterminated last line
                        return match decode_line(&buf) {
                            Ok(line) if line.is_empty() => None,
                            item => Some((item, None)),
                        };
                    }
                }
            }
        },
    );

    Box::pin(stream)
}

/// Split an already buffered body into lines, stopping after the first undecodable one.
pub fn lines_from_bytes(body: Bytes) -> LineStream {
    let mut lines = Vec::new();
    for raw in body.split(|b| *b == b'\n') {
        match decode_line(raw) {
            Ok(line) if line.is_empty() => {}
            Ok(line) => lines.push(Ok(line)),
            Err(e) => {
                lines.push(Err(e));
                break;
            }
        }
    }
    Box::pin(stream::iter(lines))
}

fn decode_line(raw: &[u8]) -> Result<String> {
    match std::str::from_utf8(raw) {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => {
            let excerpt: String = String::from_utf8_lossy(raw).chars().take(256).collect();
            Err(Error::with_context(
                ErrorKind::Unknown,
                format!("stream line is not valid UTF-8: {}", e),
                ErrorContext::new()
                    .with_details(excerpt)
                    .with_source("line_decoder"),
            ))
        }
    }
}
