// Local controller connectivity probe

use serde_json::Value;
use tracing::{debug, info};

use crate::error::Error;
use crate::local::client::LocalClient;
use crate::local::discovery::RAW_CLIENTS_PATH;
use crate::models::unwrap_envelope;

impl LocalClient {
    /// Unprefixed `GET /api/s/{site}/stat/sta`, no discovery involved.
    pub async fn raw_clients(&self) -> Result<Vec<Value>, Error> {
        let url = self.url_for("", RAW_CLIENTS_PATH)?;
        match unwrap_envelope(self.get(url).await?) {
            Value::Array(items) => Ok(items),
            other => Err(Error::Deserialization {
                message: "expected a JSON array payload".into(),
                body: other.to_string(),
            }),
        }
    }

    /// Check that the controller answers with usable data.
    ///
    /// Tries client discovery, then device discovery, then the raw client
    /// list; `true` on the first success.
    pub async fn probe(&self) -> bool {
        match self.try_list_active_clients().await {
            Ok(_) => {
                info!(url = %self.base_url(), "controller reachable (clients)");
                return true;
            }
            Err(e) => debug!(error = %e, "probe: client listing failed"),
        }
        match self.try_list_access_points().await {
            Ok(_) => {
                info!(url = %self.base_url(), "controller reachable (devices)");
                return true;
            }
            Err(e) => debug!(error = %e, "probe: device listing failed"),
        }
        match self.raw_clients().await {
            Ok(_) => {
                info!(url = %self.base_url(), "controller reachable (raw client list)");
                true
            }
            Err(e) => {
                debug!(error = %e, "probe: raw client list failed");
                false
            }
        }
    }
}
