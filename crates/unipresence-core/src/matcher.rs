// ── Identity matching ──
//
// Pure predicates deciding whether a configured descriptor is the same
// physical thing as a raw controller record. Every identity field the
// descriptor carries must match; fields it omits are not consulted.

use unipresence_api::{ClientRecord, DeviceRecord};

use crate::model::{Device, Location, MacAddress};

fn mac_matches(expected: &MacAddress, raw: Option<&str>) -> bool {
    raw.is_some_and(|raw| MacAddress::new(raw) == *expected)
}

fn ip_matches(expected: &str, raw: Option<&str>) -> bool {
    raw.is_some_and(|raw| raw.trim() == expected.trim())
}

/// Hostname against every name-like field; controllers populate them
/// inconsistently across generations.
fn hostname_matches(expected: &str, client: &ClientRecord) -> bool {
    let expected = expected.trim();
    [
        client.hostname.as_deref(),
        client.name.as_deref(),
        client.display_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|candidate| candidate.trim().eq_ignore_ascii_case(expected))
}

/// Whether `client` is the device described by `device`.
pub fn matches_client(device: &Device, client: &ClientRecord) -> bool {
    if !device.has_identity() {
        return false;
    }
    if let Some(mac) = &device.mac {
        if !mac_matches(mac, client.mac.as_deref()) {
            return false;
        }
    }
    if let Some(ip) = &device.ip {
        if !ip_matches(ip, client.ip.as_deref()) {
            return false;
        }
    }
    if let Some(hostname) = &device.hostname {
        if !hostname_matches(hostname, client) {
            return false;
        }
    }
    true
}

/// Whether `ap` is the access point described by `location`.
pub fn matches_access_point(location: &Location, ap: &DeviceRecord) -> bool {
    if location.mac.is_none() && location.ip.is_none() {
        return false;
    }
    let mac_ok = location
        .mac
        .as_ref()
        .is_none_or(|mac| mac_matches(mac, ap.mac.as_deref()));
    let ip_ok = location
        .ip
        .as_deref()
        .is_none_or(|ip| ip_matches(ip, ap.ip.as_deref()));
    mac_ok && ip_ok
}

/// First client in `clients` matching `device`.
pub fn find_client<'a>(device: &Device, clients: &'a [ClientRecord]) -> Option<&'a ClientRecord> {
    clients.iter().find(|c| matches_client(device, c))
}
