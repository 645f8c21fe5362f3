// Backend-agnostic controller client
//
// One interface over the local and cloud backends, chosen once at
// construction. Every list operation degrades to an empty result, so a
// refresh cycle built on it never aborts on a fetch.

use futures_util::future::join;
use url::Url;

use crate::auth::{BackendKind, Credentials};
use crate::cloud::CloudClient;
use crate::error::Error;
use crate::local::{BackendProfile, LocalClient};
use crate::models::{ClientRecord, DeviceRecord, TrafficSample};
use crate::transport::TransportConfig;

/// One cycle's client and access-point listings, each failing on its own.
pub type Inventory = (
    Result<Vec<ClientRecord>, Error>,
    Result<Vec<DeviceRecord>, Error>,
);

/// A controller session for one configured backend.
pub enum ControllerClient {
    Local(LocalClient),
    Cloud(CloudClient),
}

impl ControllerClient {
    /// Build the client matching `credentials`.
    ///
    /// `base_url` is the controller address for local sessions and the
    /// cloud API root for cloud sessions.
    pub fn new(
        base_url: Url,
        site: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        match credentials {
            Credentials::Local { key } => Ok(Self::Local(LocalClient::new(
                base_url,
                site.to_owned(),
                key,
                transport,
            )?)),
            Credentials::Cloud { key, host_id } => Ok(Self::Cloud(CloudClient::new(
                base_url,
                host_id.clone(),
                key,
                transport,
            )?)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Local(_) => BackendKind::Local,
            Self::Cloud(_) => BackendKind::Cloud,
        }
    }

    pub fn base_url(&self) -> &Url {
        match self {
            Self::Local(c) => c.base_url(),
            Self::Cloud(c) => c.base_url(),
        }
    }

    /// A fresh local session against another address, reusing the HTTP
    /// client and credentials. `None` for cloud sessions, whose address
    /// is fixed.
    pub fn with_base_url(&self, base_url: Url) -> Option<Self> {
        match self {
            Self::Local(c) => Some(Self::Local(c.with_base_url(base_url))),
            Self::Cloud(_) => None,
        }
    }

    /// Discovered endpoints (always empty for cloud sessions).
    pub fn profile(&self) -> BackendProfile {
        match self {
            Self::Local(c) => c.profile(),
            Self::Cloud(_) => BackendProfile::default(),
        }
    }

    pub async fn list_active_clients(&self) -> Vec<ClientRecord> {
        match self {
            Self::Local(c) => c.list_active_clients().await,
            Self::Cloud(c) => c.list_active_clients().await,
        }
    }

    pub async fn try_list_active_clients(&self) -> Result<Vec<ClientRecord>, Error> {
        match self {
            Self::Local(c) => c.try_list_active_clients().await,
            Self::Cloud(c) => c.try_list_active_clients().await,
        }
    }

    pub async fn list_access_points(&self) -> Vec<DeviceRecord> {
        match self {
            Self::Local(c) => c.list_access_points().await,
            Self::Cloud(c) => c.list_access_points().await,
        }
    }

    pub async fn try_list_access_points(&self) -> Result<Vec<DeviceRecord>, Error> {
        match self {
            Self::Local(c) => c.try_list_access_points().await,
            Self::Cloud(c) => c.try_list_access_points().await,
        }
    }

    /// Active clients and access points for one refresh cycle. Local
    /// sessions fetch both concurrently; cloud sessions split a single
    /// inventory fetch.
    pub async fn try_fetch_inventory(&self) -> Inventory {
        match self {
            Self::Local(c) => join(c.try_list_active_clients(), c.try_list_access_points()).await,
            Self::Cloud(c) => match c.try_inventory().await {
                Ok((clients, access_points)) => (Ok(clients), Ok(access_points)),
                Err(e) => {
                    let message = e.to_string();
                    (Err(e), Err(Error::Api { message }))
                }
            },
        }
    }

    pub async fn short_window_traffic(&self, mac: &str) -> Option<TrafficSample> {
        match self {
            Self::Local(c) => c.short_window_traffic(mac).await,
            Self::Cloud(c) => c.short_window_traffic(mac).await,
        }
    }

    pub async fn probe(&self) -> bool {
        match self {
            Self::Local(c) => c.probe().await,
            Self::Cloud(c) => c.probe().await,
        }
    }
}
