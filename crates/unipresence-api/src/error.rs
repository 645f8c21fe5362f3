use thiserror::Error;

/// Top-level error type for the `unipresence-api` crate.
///
/// A single HTTP exchange fails in one of three ways: the transport never
/// produced a response, the controller answered with an HTTP error, or the
/// body could not be understood. Discovery loops treat all three the same
/// (try the next candidate); callers that care can still tell them apart.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key could not be encoded as a header value.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller responses ────────────────────────────────────────
    /// The controller answered with status >= 400. The body is kept as
    /// diagnostic text only.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 200 carrying an error envelope (`meta.rc != "ok"` or the
    /// gateway-OS `{"error": {...}}` shape).
    #[error("Controller API error: {message}")]
    Api { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Discovery ───────────────────────────────────────────────────
    /// Every candidate endpoint for a resource failed.
    #[error("No working endpoint for {resource}")]
    NoEndpoint { resource: &'static str },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying next cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}
