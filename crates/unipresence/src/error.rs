//! CLI error types with miette diagnostics.
//!
//! Maps config and core errors into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use unipresence_config::ConfigError;
use unipresence_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Controller at {url} did not answer")]
    #[diagnostic(
        code(unipresence::unreachable),
        help(
            "Check that the controller is running and the API key is valid.\n\
             Tried the configured address and the usual port/proxy variants.\n\
             Run with -vv to see every attempt."
        )
    )]
    Unreachable { url: String },

    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(unipresence::connection_failed),
        help("Check the controller URL and network path.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No API key configured for '{host}'")]
    #[diagnostic(
        code(unipresence::no_credentials),
        help(
            "Set controller.api_key_env to an environment variable holding the key,\n\
             store it in the system keyring (service 'unipresence', account '{host}/api-key'),\n\
             or set controller.api_key in the config file."
        )
    )]
    NoCredentials { host: String },

    #[error("Controller rejected the API key (HTTP {status})")]
    #[diagnostic(
        code(unipresence::auth_failed),
        help("Create a key under Settings > Control Plane > Integrations.")
    )]
    AuthFailed { status: u16 },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(unipresence::validation))]
    Validation { field: String, reason: String },

    #[error("Failed to load configuration: {source}")]
    #[diagnostic(
        code(unipresence::config),
        help("Expected a TOML file at {path}")
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(unipresence::api_error))]
    Api { message: String },

    #[error("{failed} presence update(s) could not be delivered")]
    #[diagnostic(code(unipresence::sink))]
    Delivery { failed: usize },

    #[error("Presence monitor stopped unexpectedly: {0}")]
    #[diagnostic(code(unipresence::task))]
    Task(#[from] tokio::task::JoinError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(unipresence::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NoCredentials { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Wrap a config error, keeping the path it came from for the help text.
    pub fn from_config(err: ConfigError, path: &std::path::Path) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { host } => Self::NoCredentials { host },
            other => Self::Config {
                path: path.display().to_string(),
                source: other,
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Api {
                status: Some(status @ (401 | 403)),
                ..
            } => CliError::AuthFailed { status },
            CoreError::Api { message, .. } => CliError::Api { message },
            CoreError::Sink { id, message } => CliError::Api {
                message: format!("sink '{id}': {message}"),
            },
            CoreError::SinkDelivery { failed } => CliError::Delivery { failed },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(
            CliError::Unreachable { url: "x".into() }.exit_code(),
            exit_code::CONNECTION
        );
        assert_eq!(
            CliError::from(CoreError::Api {
                message: "denied".into(),
                status: Some(401),
            })
            .exit_code(),
            exit_code::AUTH
        );
        assert_eq!(
            CliError::from_config(
                ConfigError::Validation {
                    field: "controller.url".into(),
                    reason: "missing".into(),
                },
                std::path::Path::new("/tmp/config.toml"),
            )
            .exit_code(),
            exit_code::USAGE
        );
    }
}
