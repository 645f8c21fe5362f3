// Shared transport configuration for building reqwest::Client instances.
//
// Local and cloud backends share TLS and timeout settings through this
// module. Each backend injects its own API-key header as a sensitive
// default header.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// TLS verification mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed controllers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that sends `api_key` under `header` on
    /// every request.
    pub fn build_client(
        &self,
        header: &str,
        api_key: &SecretString,
    ) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| Error::InvalidApiKey(format!("invalid header value: {e}")))?;
        key_value.set_sensitive(true);
        let name = HeaderName::from_bytes(header.as_bytes())
            .map_err(|e| Error::InvalidApiKey(format!("invalid header name {header}: {e}")))?;
        headers.insert(name, key_value);
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("unipresence/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_client_with_api_key() {
        let key = SecretString::from("abc123".to_string());
        let config = TransportConfig::default();
        assert!(
            config
                .build_client(crate::auth::LOCAL_API_KEY_HEADER, &key)
                .is_ok()
        );
    }

    #[test]
    fn rejects_api_key_with_newline() {
        let key = SecretString::from("abc\n123".to_string());
        let config = TransportConfig::default();
        let result = config.build_client(crate::auth::CLOUD_API_KEY_HEADER, &key);
        assert!(matches!(result, Err(Error::InvalidApiKey(_))));
    }
}
