//! Error types for `pixxio-tools`.

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Main error type for DAM tool calls.
#[derive(Error, Debug)]
pub enum PixxioError {
    /// Missing or invalid credentials/base URL. Raised before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or missing tool parameters. Raised before any network call.
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// The request did not complete within its fixed timeout.
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Connection-level failures (DNS, TLS, refused connections, broken bodies).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The DAM answered with a non-2xx status.
    #[error("{}", upstream_message(*kind, *status, code.as_deref(), message))]
    Upstream {
        status: u16,
        kind: UpstreamKind,
        code: Option<String>,
        message: String,
    },

    /// A 2xx response that lacks data the tool needs.
    #[error("Unexpected pixx.io response: {0}")]
    UnexpectedResponse(String),

    /// Local filesystem errors while persisting downloads.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested tool name is not served. Surfaced as a protocol error, not a tool result.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Result type alias for DAM tool operations.
pub type Result<T> = std::result::Result<T, PixxioError>;

/// Classification of upstream HTTP failures. Labels only; every kind is surfaced the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    AuthenticationFailed,
    NotFound,
    RateLimited,
    ServerError,
    Other,
}

impl UpstreamKind {
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::AuthenticationFailed,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            s if s >= 500 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::Other => "http_error",
        };
        f.write_str(s)
    }
}

fn upstream_message(kind: UpstreamKind, status: u16, code: Option<&str>, message: &str) -> String {
    let headline = match kind {
        UpstreamKind::AuthenticationFailed => "Authentication failed. Check your API key.".to_string(),
        UpstreamKind::NotFound => "Resource not found.".to_string(),
        UpstreamKind::RateLimited => "Rate limit exceeded.".to_string(),
        UpstreamKind::ServerError => format!("pixx.io server error (HTTP {status})."),
        UpstreamKind::Other => format!("API error: HTTP {status}."),
    };
    match (code, message.is_empty()) {
        (Some(code), false) => format!("{headline} [{code}] {message}"),
        (Some(code), true) => format!("{headline} [{code}]"),
        (None, false) => format!("{headline} {message}"),
        (None, true) => headline,
    }
}

impl PixxioError {
    /// Map a `reqwest` failure, reporting timeouts against the budget that applied to the call.
    #[must_use]
    pub fn from_reqwest(e: &reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            Self::Timeout(timeout.as_secs())
        } else {
            Self::Transport(sanitize_reqwest_error(e))
        }
    }
}

/// Strip credentials, query and fragment so tokens never leak into error text or logs.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
