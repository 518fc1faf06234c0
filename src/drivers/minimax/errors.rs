//! MiniMax `base_resp.status_code` classification.

use crate::error::{Error, ErrorContext};
use crate::error_code::ErrorKind;

/// Known vendor codes. Anything not listed is treated as a server-side failure.
const CODE_TABLE: &[(i64, ErrorKind)] = &[
    (1000, ErrorKind::ServerUnavailable),
    (1001, ErrorKind::ServerUnavailable),
    (1002, ErrorKind::RateLimited),
    (1004, ErrorKind::InvalidCredentials),
    (1008, ErrorKind::InsufficientBalance),
    (1013, ErrorKind::ServerUnavailable),
    (1027, ErrorKind::ServerUnavailable),
    (1039, ErrorKind::RateLimited),
    (2013, ErrorKind::BadRequest),
];

pub fn kind_for_code(code: i64) -> ErrorKind {
    CODE_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::ServerUnavailable)
}

pub fn classify(code: i64, message: &str) -> Error {
    Error::with_context(
        kind_for_code(code),
        message,
        ErrorContext::new()
            .with_vendor_code(code)
            .with_source(super::PROVIDER_ID),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table() {
        assert_eq!(kind_for_code(1000), ErrorKind::ServerUnavailable);
        assert_eq!(kind_for_code(1027), ErrorKind::ServerUnavailable);
        assert_eq!(kind_for_code(1002), ErrorKind::RateLimited);
        assert_eq!(kind_for_code(1039), ErrorKind::RateLimited);
        assert_eq!(kind_for_code(1004), ErrorKind::InvalidCredentials);
        assert_eq!(kind_for_code(1008), ErrorKind::InsufficientBalance);
        assert_eq!(kind_for_code(2013), ErrorKind::BadRequest);
    }

    #[test]
    fn test_unlisted_code_is_server_side() {
        assert_eq!(kind_for_code(9999), ErrorKind::ServerUnavailable);
        assert_eq!(kind_for_code(-1), ErrorKind::ServerUnavailable);
    }

    #[test]
    fn test_message_and_code_preserved() {
        let err = classify(1004, "login fail: Please carry the API secret key");
        assert_eq!(err.message(), "login fail: Please carry the API secret key");
        assert_eq!(err.context().vendor_code, Some(1004));
        assert_eq!(err.context().source.as_deref(), Some("minimax"));
    }
}
