// unipresence-api: async client for UniFi controllers (local + cloud)
//
// Local sessions discover which endpoint generation the controller
// speaks; cloud sessions read the Site Manager device inventory. Both
// sit behind `ControllerClient`.

pub mod auth;
pub mod client;
pub mod cloud;
pub mod error;
pub mod local;
pub mod models;
pub mod transport;

pub use auth::{BackendKind, CLOUD_BASE_URL, Credentials};
pub use client::{ControllerClient, Inventory};
pub use cloud::CloudClient;
pub use error::Error;
pub use local::{BackendProfile, Endpoint, LocalClient, Resource};
pub use models::{ClientRecord, DeviceRecord, TrafficSample, unwrap_envelope};
pub use transport::{TlsMode, TransportConfig};
