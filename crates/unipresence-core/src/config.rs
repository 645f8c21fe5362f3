// ── Runtime presence configuration ──
//
// These types describe *what* to watch and *how* to reach the controller.
// They carry credential data and polling tuning, but never touch disk.
// The binary builds a `PresenceConfig` and hands it to the monitor.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use unipresence_api::{BackendKind, CLOUD_BASE_URL, Credentials, TlsMode, TransportConfig};

use crate::error::CoreError;

/// Lower bound of the refresh interval, in seconds.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 30;
/// Upper bound of the refresh interval, in seconds.
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 3600;
/// Refresh interval used when none is configured.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 180;

/// Clamp a refresh interval into the supported range.
pub fn clamp_refresh_interval(secs: u64) -> u64 {
    secs.clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS)
}

// ── Descriptors ─────────────────────────────────────────────────────

/// A personal device as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    /// Minimum 15-minute traffic, in kilobytes.
    #[serde(default)]
    pub min_traffic_amount: Option<f64>,
}

/// A person and the devices that give them away.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResidentConfig {
    pub name: String,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// An access point used as a room-level locality.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub name: String,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

// ── PresenceConfig ──────────────────────────────────────────────────

/// Everything the monitor needs to run.
///
/// Built by the binary from the config file -- core never reads config files.
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Controller URL for local sessions, API root for cloud sessions.
    pub url: Url,
    pub credentials: Credentials,
    /// Site to watch (defaults to "default").
    pub site: String,
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Seconds between refresh cycles, already clamped.
    pub refresh_interval_secs: u64,
    /// Emit the aggregate "anyone home" update.
    pub global_sink: bool,
    pub residents: Vec<ResidentConfig>,
    pub locations: Vec<LocationConfig>,
}

impl PresenceConfig {
    /// Minimal config for a local controller; descriptors are added by the caller.
    pub fn local(url: Url, credentials: Credentials) -> Self {
        Self {
            url,
            credentials,
            site: "default".into(),
            tls: TlsMode::DangerAcceptInvalid,
            timeout: Duration::from_secs(30),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            global_sink: true,
            residents: Vec::new(),
            locations: Vec::new(),
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.credentials.kind()
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(clamp_refresh_interval(self.refresh_interval_secs))
    }

    /// Reject configurations the monitor cannot start from.
    pub fn validate(&self) -> Result<(), CoreError> {
        if matches!(&self.credentials, Credentials::Cloud { host_id, .. } if host_id.trim().is_empty())
        {
            return Err(CoreError::Config {
                message: "cloud backend requires a host_id".into(),
            });
        }
        if self.site.trim().is_empty() {
            return Err(CoreError::Config {
                message: "site must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Default API root for cloud sessions.
    pub fn cloud_url() -> Result<Url, CoreError> {
        Url::parse(CLOUD_BASE_URL).map_err(|e| CoreError::Config {
            message: format!("invalid cloud URL: {e}"),
        })
    }
}
