use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// API-key header understood by local controllers (gateway-OS proxy and
/// classic Network Application).
pub const LOCAL_API_KEY_HEADER: &str = "X-API-KEY";

/// API-key header understood by the cloud Site Manager API.
pub const CLOUD_API_KEY_HEADER: &str = "X-API-Key";

/// Default base address of the cloud aggregation API.
pub const CLOUD_BASE_URL: &str = "https://api.ui.com";

/// Which controller family a session talks to.
///
/// Selected once from configuration; the product generation behind a
/// local address is discovered at runtime instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Gateway-OS console or classic controller on the local network.
    #[default]
    Local,
    /// Cloud aggregation API (Site Manager).
    Cloud,
}

impl BackendKind {
    /// The API-key header name for this backend.
    pub fn api_key_header(self) -> &'static str {
        match self {
            Self::Local => LOCAL_API_KEY_HEADER,
            Self::Cloud => CLOUD_API_KEY_HEADER,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Cloud => f.write_str("cloud"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "unifi-os" | "classic" => Ok(Self::Local),
            "cloud" | "site-manager" => Ok(Self::Cloud),
            other => Err(format!("expected 'local' or 'cloud', got '{other}'")),
        }
    }
}

/// Credentials for one controller session.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Local API key (Network > Settings > Control Plane > Integrations).
    Local { key: SecretString },

    /// Cloud API key plus the console host the presence data comes from.
    Cloud { key: SecretString, host_id: String },
}

impl Credentials {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Local { .. } => BackendKind::Local,
            Self::Cloud { .. } => BackendKind::Cloud,
        }
    }

    pub fn key(&self) -> &SecretString {
        match self {
            Self::Local { key } | Self::Cloud { key, .. } => key,
        }
    }
}
