// ── Core error types ──
//
// User-facing errors from unipresence-core. Fetch failures inside a
// refresh cycle never surface here; they degrade to empty data. What
// remains is configuration, client construction, and sink delivery.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Delivery errors ──────────────────────────────────────────────
    #[error("Sink '{id}' rejected update: {message}")]
    Sink { id: String, message: String },

    #[error("{failed} sink update(s) failed this cycle")]
    SinkDelivery { failed: usize },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<unipresence_api::Error> for CoreError {
    fn from(err: unipresence_api::Error) -> Self {
        use unipresence_api::Error as Api;
        match err {
            Api::InvalidApiKey(message) => CoreError::Config {
                message: format!("invalid API key: {message}"),
            },
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            Api::Tls(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {reason}"),
            },
            Api::Transport(ref e) => CoreError::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string),
                reason: e.to_string(),
            },
            Api::Http { status, body } => CoreError::Api {
                message: body,
                status: Some(status),
            },
            Api::Api { message } => CoreError::Api {
                message,
                status: None,
            },
            Api::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
            Api::NoEndpoint { resource } => CoreError::Api {
                message: format!("no working endpoint for {resource}"),
                status: None,
            },
        }
    }
}
