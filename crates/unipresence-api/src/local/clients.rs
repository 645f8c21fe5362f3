// Local controller client (station) endpoints
//
// Active-client listing through endpoint discovery, plus the
// short-window traffic report used to qualify presence.

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::Error;
use crate::local::client::LocalClient;
use crate::local::discovery::{self, Resource, TRAFFIC_PATH};
use crate::models::{ClientRecord, TrafficBucket, TrafficSample, unwrap_envelope};

/// Width of the traffic qualification window.
pub const TRAFFIC_WINDOW_MINUTES: i64 = 15;

impl LocalClient {
    /// List currently connected clients, discovering the endpoint on
    /// first use. Fails only when every candidate failed.
    pub async fn try_list_active_clients(&self) -> Result<Vec<ClientRecord>, Error> {
        self.discover(Resource::Clients).await
    }

    /// List currently connected clients. A failed fetch yields an empty
    /// list so a refresh cycle never aborts on it.
    pub async fn list_active_clients(&self) -> Vec<ClientRecord> {
        match self.try_list_active_clients().await {
            Ok(clients) => {
                debug!(count = clients.len(), "fetched active clients");
                clients
            }
            Err(e) => {
                warn!(error = %e, "client fetch failed; treating as empty");
                Vec::new()
            }
        }
    }

    /// Bytes received and sent by `mac` over the last 15 minutes.
    ///
    /// `POST {prefix}/api/s/{site}/stat/report/5minutes.user`. Uses the
    /// discovered prefix when known, otherwise tries each prefix in
    /// order. `None` when no report could be retrieved.
    pub async fn short_window_traffic(&self, mac: &str) -> Option<TrafficSample> {
        let end = Utc::now();
        let start = end - Duration::minutes(TRAFFIC_WINDOW_MINUTES);
        let body = json!({
            "attrs": ["rx_bytes", "tx_bytes", "time"],
            "macs": [mac.to_lowercase()],
            "start": start.timestamp_millis(),
            "end": end.timestamp_millis(),
        });

        for prefix in discovery::prefixes(self.base_url(), self.profile().prefix) {
            let url = match self.url_for(prefix, TRAFFIC_PATH) {
                Ok(url) => url,
                Err(e) => {
                    debug!(error = %e, "invalid traffic report URL");
                    continue;
                }
            };
            match self.post(url, &body).await {
                Ok(value) => match serde_json::from_value::<Vec<TrafficBucket>>(unwrap_envelope(value)) {
                    Ok(buckets) => return Some(TrafficSample::from_buckets(&buckets)),
                    Err(e) => debug!(mac, error = %e, "malformed traffic report"),
                },
                Err(e) => debug!(mac, prefix, error = %e, "traffic report unavailable"),
            }
        }

        warn!(mac, "no traffic sample available");
        None
    }
}
