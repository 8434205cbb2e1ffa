//! Client-side error taxonomy.
//!
//! DESIGN
//! ======
//! Transport and server failures propagate unchanged to the calling page,
//! which owns presentation. `RefreshFailed` is the one variant produced after
//! a global session teardown; it wraps the refresh error rather than the
//! 401 that triggered it.

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Generic text shown when an error carries nothing more specific.
pub const FALLBACK_MESSAGE: &str = "Đã có lỗi xảy ra";

/// Errors produced by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the configured deadline.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status or a `success: false` envelope.
    #[error("server error {status}: {message}")]
    Server { status: u16, code: Option<String>, message: String },

    /// No usable credentials; the request cannot be authorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Renewing the access token failed; the session has been torn down.
    #[error("token refresh failed: {0}")]
    RefreshFailed(#[source] Box<ClientError>),

    /// Login was rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Input rejected before it reached the network.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// A response body did not match the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The durable token store could not be read or written.
    #[error("token storage failed: {0}")]
    Storage(String),

    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Config(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ClientError {
    /// Stable machine-readable code for logs and UI branching.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::Timeout => "E_TIMEOUT",
            Self::Server { .. } => "E_SERVER",
            Self::Unauthorized(_) => "E_UNAUTHORIZED",
            Self::RefreshFailed(_) => "E_REFRESH_FAILED",
            Self::Auth(_) => "E_AUTH",
            Self::Validation { .. } => "E_VALIDATION",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
            Self::Config(_) => "E_CONFIG",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether the caller may reasonably try the same call again.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout | Self::Server { status: 429 | 500..=599, .. })
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(401),
            Self::RefreshFailed(inner) => inner.status(),
            _ => None,
        }
    }

    /// Text a page shows in a toast for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Server { message, .. } | Self::Unauthorized(message) | Self::Auth(message) => message.clone(),
            Self::Validation { message, .. } => message.clone(),
            Self::RefreshFailed(inner) => return inner.user_message(),
            other => other.to_string(),
        };
        if message.trim().is_empty() { FALLBACK_MESSAGE.to_owned() } else { message }
    }
}
