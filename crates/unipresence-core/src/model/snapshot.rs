// ── Published presence snapshot ──
//
// Immutable view of one finished cycle, broadcast to observers. Plain
// data so the CLI can print it as a table or JSON.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::presence::{Device, Location, Resident};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceStatus {
    pub name: String,
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub traffic_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentStatus {
    pub id: String,
    pub name: String,
    pub is_home: bool,
    pub summary: String,
    pub devices: Vec<DeviceStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationStatus {
    pub id: String,
    pub name: String,
    pub mac: Option<String>,
    pub occupied: bool,
    pub present: Vec<String>,
}

/// State after the most recent refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresenceSnapshot {
    /// Completion time of the cycle; `None` before the first one.
    pub refreshed_at: Option<DateTime<Utc>>,
    pub anyone_home: bool,
    /// "Home: A, B" / "Nobody home".
    pub summary: String,
    pub residents: Vec<ResidentStatus>,
    pub locations: Vec<LocationStatus>,
}

impl PresenceSnapshot {
    pub fn capture(residents: &[Resident], locations: &[Location], at: DateTime<Utc>) -> Self {
        Self {
            refreshed_at: Some(at),
            anyone_home: residents.iter().any(|r| r.is_home),
            summary: crate::sink::global_summary(residents),
            residents: residents.iter().map(ResidentStatus::from).collect(),
            locations: locations
                .iter()
                .map(|l| LocationStatus {
                    id: l.id.clone(),
                    name: l.name.clone(),
                    mac: l.resolved_mac.as_ref().map(ToString::to_string),
                    occupied: l.occupied,
                    present: l.present(residents).into_iter().map(str::to_owned).collect(),
                })
                .collect(),
        }
    }
}

impl From<&Device> for DeviceStatus {
    fn from(d: &Device) -> Self {
        Self {
            name: d.name.clone(),
            online: d.online,
            last_seen: d.last_seen,
            location: d.current_location.as_ref().map(ToString::to_string),
            traffic_bytes: d.traffic_bytes,
        }
    }
}

impl From<&Resident> for ResidentStatus {
    fn from(r: &Resident) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            is_home: r.is_home,
            summary: r.summary(),
            devices: r.devices.iter().map(DeviceStatus::from).collect(),
        }
    }
}
