//! 统一错误分类：网关对外暴露的错误种类及其重试语义。
//!
//! Uniform error kinds.
//!
//! Every failure the gateway surfaces belongs to exactly one [`ErrorKind`]. Vendor adapters map
//! their own numeric codes onto these kinds; callers only ever branch on the kind.
//!
//! ## Categories
//!
//! | Kind                  | Category | Retryable |
//! |-----------------------|----------|-----------|
//! | `BadRequest`          | client   | no        |
//! | `InvalidCredentials`  | client   | no        |
//! | `InsufficientBalance` | billing  | no        |
//! | `RateLimited`         | rate     | yes       |
//! | `ServerUnavailable`   | server   | yes       |
//! | `ConnectionError`     | network  | yes       |
//! | `Unknown`             | unknown  | no        |
//!
//! ## Example
//!
//! ```rust
//! use ai_gateway::error_code::ErrorKind;
//!
//! let kind = ErrorKind::from_http_status(429);
//! assert_eq!(kind.name(), "rate_limited");
//! assert!(kind.retryable());
//! ```

use std::fmt;

/// Tag of a uniform gateway error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request, unsupported model or missing messages
    BadRequest,
    /// Missing, invalid or expired credentials
    InvalidCredentials,
    /// Vendor-side request rate limit hit
    RateLimited,
    /// Account balance exhausted
    InsufficientBalance,
    /// Vendor failed or returned something we could not classify as a caller error
    ServerUnavailable,
    /// DNS, connect, timeout or body read failure
    ConnectionError,
    /// Response could not be interpreted at all
    Unknown,
}

impl ErrorKind {
    /// Returns the stable name (e.g. `"bad_request"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::InvalidCredentials => "invalid_credentials",
            Self::RateLimited => "rate_limited",
            Self::InsufficientBalance => "insufficient_balance",
            Self::ServerUnavailable => "server_unavailable",
            Self::ConnectionError => "connection_error",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a caller may retry the same request unchanged.
    ///
    /// Validation failures are deterministic and never retryable.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerUnavailable | Self::ConnectionError
        )
    }

    /// Returns the category: `"client"`, `"billing"`, `"rate"`, `"server"`, `"network"` or
    /// `"unknown"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::BadRequest | Self::InvalidCredentials => "client",
            Self::InsufficientBalance => "billing",
            Self::RateLimited => "rate",
            Self::ServerUnavailable => "server",
            Self::ConnectionError => "network",
            Self::Unknown => "unknown",
        }
    }

    /// Maps an HTTP status to the most likely kind.
    ///
    /// Only used as a hint for logging; the authoritative classification of a vendor failure
    /// comes from the vendor's own error envelope.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 404 | 413 | 422 => Self::BadRequest,
            401 | 403 => Self::InvalidCredentials,
            402 => Self::InsufficientBalance,
            408 => Self::ConnectionError,
            429 => Self::RateLimited,
            500..=599 => Self::ServerUnavailable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
