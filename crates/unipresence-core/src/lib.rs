//! Presence engine between `unipresence-api` and the binary.
//!
//! - **[`PresenceMonitor`]**: the refresh loop. Probes the controller
//!   (with startup address alternates), then every interval fetches
//!   clients and access points, updates presence state and notifies
//!   sinks. Fetch failures degrade to empty data and never stop the loop.
//!
//! - **[`matcher`]**: conjunctive identity matching of configured
//!   devices and locations against raw controller records.
//!
//! - **Domain model** ([`model`]): [`Device`], [`Resident`], [`Location`]
//!   and the published [`PresenceSnapshot`].
//!
//! - **[`PresenceSink`]**: where occupancy updates go.

pub mod config;
pub mod error;
pub mod matcher;
pub mod model;
pub mod monitor;
pub mod sink;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    DEFAULT_REFRESH_INTERVAL_SECS, DeviceConfig, LocationConfig, MAX_REFRESH_INTERVAL_SECS,
    MIN_REFRESH_INTERVAL_SECS, PresenceConfig, ResidentConfig, clamp_refresh_interval,
};
pub use error::CoreError;
pub use model::{
    Device, DeviceStatus, Location, LocationStatus, MacAddress, PresenceSnapshot, Resident,
    ResidentStatus,
};
pub use monitor::{MonitorState, PresenceMonitor};
pub use sink::{PresenceSink, SinkUpdate, global_summary, location_summary};

// Controller-side types callers need to build a config.
pub use unipresence_api::{BackendKind, Credentials, TlsMode};
