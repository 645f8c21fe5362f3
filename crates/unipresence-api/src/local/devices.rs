// Local controller device endpoints
//
// Network devices (gateways, switches, access points) through endpoint
// discovery. Presence only needs their identity fields.

use tracing::{debug, warn};

use crate::error::Error;
use crate::local::client::LocalClient;
use crate::local::discovery::Resource;
use crate::models::DeviceRecord;

impl LocalClient {
    /// List managed network devices. Fails only when every candidate
    /// endpoint failed.
    pub async fn try_list_access_points(&self) -> Result<Vec<DeviceRecord>, Error> {
        self.discover(Resource::Devices).await
    }

    /// List managed network devices, degrading to an empty list.
    pub async fn list_access_points(&self) -> Vec<DeviceRecord> {
        match self.try_list_access_points().await {
            Ok(devices) => {
                debug!(count = devices.len(), "fetched network devices");
                devices
            }
            Err(e) => {
                warn!(error = %e, "device fetch failed; treating as empty");
                Vec::new()
            }
        }
    }
}
