// ── Presence sinks ──
//
// Downstream consumers of occupancy (home-automation accessories, logs).
// The monitor pushes one update per resident, per location, and
// optionally one global update at the end of every cycle.

use serde::Serialize;

use crate::error::CoreError;
use crate::model::{Location, Resident};

/// Sink id of the aggregate "anyone home" update.
pub const GLOBAL_SINK_ID: &str = "global";
/// Display name of the aggregate update.
pub const GLOBAL_SINK_NAME: &str = "Anyone Home";

/// One occupancy signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkUpdate {
    pub id: String,
    pub display_name: String,
    pub occupied: bool,
    /// One-line human-readable status.
    pub summary: String,
}

/// Receives occupancy updates.
///
/// Called from the monitor task once per cycle and update; must not block.
pub trait PresenceSink: Send + Sync {
    fn notify(&self, update: &SinkUpdate) -> Result<(), CoreError>;
}

impl<F> PresenceSink for F
where
    F: Fn(&SinkUpdate) -> Result<(), CoreError> + Send + Sync,
{
    fn notify(&self, update: &SinkUpdate) -> Result<(), CoreError> {
        self(update)
    }
}

/// "Home: A, B" / "Nobody home".
pub fn global_summary(residents: &[Resident]) -> String {
    let home: Vec<&str> = residents
        .iter()
        .filter(|r| r.is_home)
        .map(|r| r.name.as_str())
        .collect();
    if home.is_empty() {
        "Nobody home".to_owned()
    } else {
        format!("Home: {}", home.join(", "))
    }
}

/// "Present: A" / "No one present".
pub fn location_summary(location: &Location, residents: &[Resident]) -> String {
    let present = location.present(residents);
    if present.is_empty() {
        "No one present".to_owned()
    } else {
        format!("Present: {}", present.join(", "))
    }
}

/// Every update for the current state, in notification order.
pub fn updates(residents: &[Resident], locations: &[Location], global: bool) -> Vec<SinkUpdate> {
    let mut out: Vec<SinkUpdate> = residents
        .iter()
        .map(|r| SinkUpdate {
            id: r.id.clone(),
            display_name: r.name.clone(),
            occupied: r.is_home,
            summary: r.summary(),
        })
        .collect();

    out.extend(locations.iter().map(|l| SinkUpdate {
        id: l.id.clone(),
        display_name: l.name.clone(),
        occupied: l.occupied,
        summary: location_summary(l, residents),
    }));

    if global {
        out.push(SinkUpdate {
            id: GLOBAL_SINK_ID.to_owned(),
            display_name: GLOBAL_SINK_NAME.to_owned(),
            occupied: residents.iter().any(|r| r.is_home),
            summary: global_summary(residents),
        });
    }
    out
}
