// Cloud aggregation (Site Manager) client
//
// Base: https://api.ui.com
// Auth: X-API-Key header
//
// The cloud API has no active-clients or traffic resource. Presence is
// derived from the managed-device inventory of one console host.

use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::models::{ClientRecord, DeviceRecord, TrafficSample, decode_list};
use crate::transport::TransportConfig;

/// Managed-device inventory, grouped by console host.
const DEVICES_PATH: &str = "ea/devices";

/// Product line of networking gear in the device inventory.
const NETWORK_PRODUCT_LINE: &str = "network";

/// Model prefixes of access points and switches.
const AP_MODEL_PREFIXES: &[&str] = &["UAP", "U6", "U7", "UAL", "UWB", "USW", "US-", "UBB"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostDevices {
    #[serde(default)]
    host_id: Option<String>,
    #[serde(default)]
    devices: Vec<CloudDevice>,
}

/// One device in the cloud inventory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDevice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub shortname: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub product_line: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl CloudDevice {
    fn is_network_product(&self) -> bool {
        self.product_line
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(NETWORK_PRODUCT_LINE))
    }

    fn is_access_point(&self) -> bool {
        [self.model.as_deref(), self.shortname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::to_ascii_uppercase)
            .any(|model| AP_MODEL_PREFIXES.iter().any(|p| model.starts_with(p)))
    }

    fn to_client(&self) -> ClientRecord {
        ClientRecord {
            mac: self.mac.clone(),
            ip: self.ip.clone(),
            hostname: self.name.clone(),
            name: self.name.clone(),
            ..ClientRecord::default()
        }
    }

    fn to_device(&self) -> DeviceRecord {
        DeviceRecord {
            mac: self.mac.clone(),
            ip: self.ip.clone(),
            name: self.name.clone(),
            model: self.model.clone().or_else(|| self.shortname.clone()),
            ..DeviceRecord::default()
        }
    }
}

/// Client for the cloud aggregation API, scoped to one console host.
pub struct CloudClient {
    http: reqwest::Client,
    base_url: Url,
    host_id: String,
}

impl CloudClient {
    pub fn new(
        base_url: Url,
        host_id: String,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(crate::auth::CLOUD_API_KEY_HEADER, api_key)?;
        Ok(Self::with_client(http, base_url, host_id))
    }

    pub fn with_client(http: reqwest::Client, base_url: Url, host_id: String) -> Self {
        Self {
            http,
            base_url,
            host_id,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    /// All devices the configured host manages.
    ///
    /// `GET /ea/devices`
    pub async fn managed_devices(&self) -> Result<Vec<CloudDevice>, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{base}/{DEVICES_PATH}"))?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        let body = resp.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.clone(),
        })?;

        let hosts: Vec<HostDevices> = decode_list(value)?;
        let devices: Vec<CloudDevice> = hosts
            .into_iter()
            .filter(|h| h.host_id.as_deref() == Some(self.host_id.as_str()))
            .flat_map(|h| h.devices)
            .collect();
        if devices.is_empty() {
            debug!(host_id = %self.host_id, "no devices reported for host");
        }
        Ok(devices)
    }

    /// Networking-product devices rendered as client records.
    pub async fn try_list_active_clients(&self) -> Result<Vec<ClientRecord>, Error> {
        Ok(clients_of(&self.managed_devices().await?))
    }

    pub async fn list_active_clients(&self) -> Vec<ClientRecord> {
        self.try_list_active_clients().await.unwrap_or_else(|e| {
            warn!(error = %e, "cloud client fetch failed; treating as empty");
            Vec::new()
        })
    }

    /// Managed devices whose model marks them as an access point or switch.
    pub async fn try_list_access_points(&self) -> Result<Vec<DeviceRecord>, Error> {
        Ok(access_points_of(&self.managed_devices().await?))
    }

    /// Clients and access points split from one inventory fetch.
    pub async fn try_inventory(&self) -> Result<(Vec<ClientRecord>, Vec<DeviceRecord>), Error> {
        let devices = self.managed_devices().await?;
        Ok((clients_of(&devices), access_points_of(&devices)))
    }

    pub async fn list_access_points(&self) -> Vec<DeviceRecord> {
        self.try_list_access_points().await.unwrap_or_else(|e| {
            warn!(error = %e, "cloud device fetch failed; treating as empty");
            Vec::new()
        })
    }

    /// The cloud API exposes no per-client traffic.
    #[allow(clippy::unused_async)]
    pub async fn short_window_traffic(&self, _mac: &str) -> Option<TrafficSample> {
        None
    }

    /// Clients and access points both come from the inventory, so one
    /// fetch decides reachability.
    pub async fn probe(&self) -> bool {
        match self.managed_devices().await {
            Ok(_) => {
                info!(host_id = %self.host_id, "cloud API reachable");
                true
            }
            Err(e) => {
                warn!(host_id = %self.host_id, error = %e, "cloud API unreachable");
                false
            }
        }
    }
}

fn clients_of(devices: &[CloudDevice]) -> Vec<ClientRecord> {
    devices
        .iter()
        .filter(|d| d.is_network_product())
        .map(CloudDevice::to_client)
        .collect()
}

fn access_points_of(devices: &[CloudDevice]) -> Vec<DeviceRecord> {
    devices
        .iter()
        .filter(|d| d.is_access_point())
        .map(CloudDevice::to_device)
        .collect()
}
