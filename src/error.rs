use crate::error_code::ErrorKind;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Numeric error code reported by the vendor (e.g. `base_resp.status_code`)
    pub vendor_code: Option<i64>,
    /// HTTP status of the response that carried the error
    pub http_status: Option<u16>,
    /// Gateway-generated correlation id of the call
    pub request_id: Option<String>,
    /// Additional context (e.g. field name, raw body excerpt)
    pub details: Option<String>,
    /// Component that raised the error (e.g. "request_builder", "http_transport")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vendor_code(mut self, code: i64) -> Self {
        self.vendor_code = Some(code);
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Uniform gateway error.
///
/// Every variant carries the original (vendor or transport) message verbatim, so callers can
/// surface it to users without knowing which provider produced it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Bad request: {message}{}", format_context(.context))]
    BadRequest {
        message: String,
        context: ErrorContext,
    },

    #[error("Invalid credentials: {message}{}", format_context(.context))]
    InvalidCredentials {
        message: String,
        context: ErrorContext,
    },

    #[error("Rate limited: {message}{}", format_context(.context))]
    RateLimited {
        message: String,
        context: ErrorContext,
    },

    #[error("Insufficient balance: {message}{}", format_context(.context))]
    InsufficientBalance {
        message: String,
        context: ErrorContext,
    },

    #[error("Server unavailable: {message}{}", format_context(.context))]
    ServerUnavailable {
        message: String,
        context: ErrorContext,
    },

    #[error("Connection error: {message}{}", format_context(.context))]
    ConnectionError {
        message: String,
        context: ErrorContext,
    },

    #[error("Unknown error: {message}{}", format_context(.context))]
    Unknown {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(code) = ctx.vendor_code {
        parts.push(format!("vendor_code: {}", code));
    }
    if let Some(status) = ctx.http_status {
        parts.push(format!("http_status: {}", status));
    }
    if let Some(ref id) = ctx.request_id {
        parts.push(format!("request_id: {}", id));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create an error of the given kind with an empty context.
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self::with_context(kind, msg, ErrorContext::new())
    }

    /// Create an error of the given kind with structured context.
    pub fn with_context(kind: ErrorKind, msg: impl Into<String>, context: ErrorContext) -> Self {
        let message = msg.into();
        match kind {
            ErrorKind::BadRequest => Error::BadRequest { message, context },
            ErrorKind::InvalidCredentials => Error::InvalidCredentials { message, context },
            ErrorKind::RateLimited => Error::RateLimited { message, context },
            ErrorKind::InsufficientBalance => Error::InsufficientBalance { message, context },
            ErrorKind::ServerUnavailable => Error::ServerUnavailable { message, context },
            ErrorKind::ConnectionError => Error::ConnectionError { message, context },
            ErrorKind::Unknown => Error::Unknown { message, context },
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCredentials, msg)
    }

    pub fn server_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerUnavailable, msg)
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionError, msg)
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, msg)
    }

    /// The kind tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadRequest { .. } => ErrorKind::BadRequest,
            Error::InvalidCredentials { .. } => ErrorKind::InvalidCredentials,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Error::ServerUnavailable { .. } => ErrorKind::ServerUnavailable,
            Error::ConnectionError { .. } => ErrorKind::ConnectionError,
            Error::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// The original vendor or transport message.
    pub fn message(&self) -> &str {
        match self {
            Error::BadRequest { message, .. }
            | Error::InvalidCredentials { message, .. }
            | Error::RateLimited { message, .. }
            | Error::InsufficientBalance { message, .. }
            | Error::ServerUnavailable { message, .. }
            | Error::ConnectionError { message, .. }
            | Error::Unknown { message, .. } => message,
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Error::BadRequest { context, .. }
            | Error::InvalidCredentials { context, .. }
            | Error::RateLimited { context, .. }
            | Error::InsufficientBalance { context, .. }
            | Error::ServerUnavailable { context, .. }
            | Error::ConnectionError { context, .. }
            | Error::Unknown { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Error::BadRequest { context, .. }
            | Error::InvalidCredentials { context, .. }
            | Error::RateLimited { context, .. }
            | Error::InsufficientBalance { context, .. }
            | Error::ServerUnavailable { context, .. }
            | Error::ConnectionError { context, .. }
            | Error::Unknown { context, .. } => context,
        }
    }

    /// Attach the call's request id, keeping any id already present.
    pub fn with_request_id(mut self, id: &str) -> Self {
        let ctx = self.context_mut();
        if ctx.request_id.is_none() {
            ctx.request_id = Some(id.to_string());
        }
        self
    }

    /// Record the HTTP status that carried this error.
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.context_mut().http_status = Some(status);
        self
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind().retryable()
    }
}
