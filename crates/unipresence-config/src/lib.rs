//! Configuration for the unipresence daemon.
//!
//! One TOML file (plus `UNIPRESENCE_` environment overrides), API-key
//! resolution (env + keyring + plaintext), and translation to
//! `unipresence_core::PresenceConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

use unipresence_core::{
    BackendKind, Credentials, DEFAULT_REFRESH_INTERVAL_SECS, LocationConfig, PresenceConfig,
    ResidentConfig, TlsMode, clamp_refresh_interval,
};

/// Keyring service name for stored API keys.
pub const KEYRING_SERVICE: &str = "unipresence";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for controller '{host}'")]
    NoCredentials { host: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Seconds between refresh cycles (clamped to 30..=3600).
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Publish the aggregate "Anyone Home" sink.
    #[serde(default = "default_true")]
    pub global_sink: bool,

    #[serde(default)]
    pub controller: ControllerSection,

    #[serde(default)]
    pub residents: Vec<ResidentConfig>,

    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            global_sink: true,
            controller: ControllerSection::default(),
            residents: Vec::new(),
            locations: Vec::new(),
        }
    }
}

/// The `[controller]` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControllerSection {
    /// Controller base URL (e.g., "https://192.168.1.1"). Optional for cloud.
    pub url: Option<String>,

    /// API key in plaintext. Prefer the keyring or `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    #[serde(default = "default_site")]
    pub site: String,

    /// Verify the controller's certificate. Local consoles are usually self-signed.
    #[serde(default)]
    pub verify_tls: bool,

    /// Path to custom CA certificate (implies verification).
    pub ca_cert: Option<PathBuf>,

    /// "local" or "cloud".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Console host id, required for the cloud backend.
    pub host_id: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            api_key_env: None,
            site: default_site(),
            verify_tls: false,
            ca_cert: None,
            backend: default_backend(),
            host_id: None,
            timeout: default_timeout(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}
fn default_true() -> bool {
    true
}
fn default_site() -> String {
    "default".into()
}
fn default_backend() -> String {
    "local".into()
}
fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "unipresence", "unipresence").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("unipresence");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields defaults.
///
/// Environment keys nest with `__`, e.g. `UNIPRESENCE_CONTROLLER__URL`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("UNIPRESENCE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_account(host: &str) -> String {
    format!("{host}/api-key")
}

/// Resolve the API key: `api_key_env`, then the keyring, then plaintext.
pub fn resolve_api_key(section: &ControllerSection, host: &str) -> Result<SecretString, ConfigError> {
    // 1. Named env var
    if let Some(val) = section
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|v| !v.trim().is_empty())
    {
        return Ok(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(host))
        .ok()
        .and_then(|entry| entry.get_password().ok())
    {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(key) = section.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        return Ok(SecretString::from(key.to_owned()));
    }

    Err(ConfigError::NoCredentials { host: host.into() })
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    pub fn backend(&self) -> Result<BackendKind, ConfigError> {
        self.controller
            .backend
            .parse()
            .map_err(|reason: String| invalid("controller.backend", reason))
    }

    /// Controller URL: configured, or the cloud API root for cloud sessions.
    pub fn url(&self) -> Result<Url, ConfigError> {
        match (self.controller.url.as_deref(), self.backend()?) {
            (Some(raw), _) => Url::parse(raw.trim())
                .map_err(|e| invalid("controller.url", format!("invalid URL '{raw}': {e}"))),
            (None, BackendKind::Cloud) => PresenceConfig::cloud_url()
                .map_err(|e| invalid("controller.url", e.to_string())),
            (None, BackendKind::Local) => Err(invalid("controller.url", "missing controller URL")),
        }
    }

    fn tls(&self) -> TlsMode {
        match (&self.controller.ca_cert, self.controller.verify_tls) {
            (Some(path), _) => TlsMode::CustomCa(path.clone()),
            (None, true) => TlsMode::System,
            (None, false) => TlsMode::DangerAcceptInvalid,
        }
    }

    fn credentials(&self, backend: BackendKind, url: &Url) -> Result<Credentials, ConfigError> {
        match backend {
            BackendKind::Local => {
                let host = url.host_str().unwrap_or("controller");
                let key = resolve_api_key(&self.controller, host)?;
                Ok(Credentials::Local { key })
            }
            BackendKind::Cloud => {
                let host_id = self
                    .controller
                    .host_id
                    .clone()
                    .filter(|h| !h.trim().is_empty())
                    .ok_or_else(|| invalid("controller.host_id", "required for the cloud backend"))?;
                let key = resolve_api_key(&self.controller, &host_id)?;
                Ok(Credentials::Cloud { key, host_id })
            }
        }
    }

    fn check_descriptors(&self) -> Result<(), ConfigError> {
        for resident in &self.residents {
            if resident.name.trim().is_empty() {
                return Err(invalid("residents.name", "must not be empty"));
            }
            for device in &resident.devices {
                if device.name.trim().is_empty() {
                    return Err(invalid(
                        "residents.devices.name",
                        format!("device of '{}' has no name", resident.name),
                    ));
                }
                if device.min_traffic_amount.is_some_and(|kb| !kb.is_finite() || kb < 0.0) {
                    return Err(invalid(
                        "residents.devices.min_traffic_amount",
                        format!("'{}' must be a non-negative number", device.name),
                    ));
                }
                let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
                if blank(&device.mac) && blank(&device.ip) && blank(&device.hostname) {
                    warn!(
                        resident = %resident.name,
                        device = %device.name,
                        "device has no mac, ip or hostname and will never be seen"
                    );
                }
            }
        }
        for location in &self.locations {
            if location.name.trim().is_empty() {
                return Err(invalid("locations.name", "must not be empty"));
            }
        }
        Ok(())
    }

    /// Validate and translate into the monitor's runtime config.
    pub fn to_presence_config(&self) -> Result<PresenceConfig, ConfigError> {
        let backend = self.backend()?;
        let url = self.url()?;
        let credentials = self.credentials(backend, &url)?;
        self.check_descriptors()?;

        if self.controller.site.trim().is_empty() {
            return Err(invalid("controller.site", "must not be empty"));
        }

        let refresh_interval_secs = clamp_refresh_interval(self.refresh_interval);
        if refresh_interval_secs != self.refresh_interval {
            warn!(
                configured = self.refresh_interval,
                using = refresh_interval_secs,
                "refresh_interval out of range; clamped"
            );
        }

        Ok(PresenceConfig {
            url,
            credentials,
            site: self.controller.site.trim().to_owned(),
            tls: self.tls(),
            timeout: Duration::from_secs(self.controller.timeout.max(1)),
            refresh_interval_secs,
            global_sink: self.global_sink,
            residents: self.residents.clone(),
            locations: self.locations.clone(),
        })
    }
}
