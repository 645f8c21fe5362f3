// ── Presence state ──
//
// Devices, residents and locations are built once from configuration.
// Their identity never changes; the derived flags are rewritten once per
// refresh cycle by the monitor, which is the only writer.

use chrono::{DateTime, Utc};
use serde::Serialize;

use unipresence_api::{ClientRecord, DeviceRecord, TrafficSample};

use super::mac::MacAddress;
use super::slugify;
use crate::config::{DeviceConfig, LocationConfig, ResidentConfig};
use crate::matcher;

// ── Device ──────────────────────────────────────────────────────────

/// A configured personal device (phone, watch, laptop).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub mac: Option<MacAddress>,
    pub ip: Option<String>,
    pub hostname: Option<String>,
    /// Minimum traffic over the report window, in kilobytes.
    pub min_traffic_amount: Option<f64>,

    // Derived per cycle
    pub online: bool,
    pub last_seen: Option<DateTime<Utc>>,
    /// Canonical MAC of the access point / switch the device is attached to.
    pub current_location: Option<MacAddress>,
    pub traffic_bytes: u64,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: slugify(&name),
            name,
            mac: None,
            ip: None,
            hostname: None,
            min_traffic_amount: None,
            online: false,
            last_seen: None,
            current_location: None,
            traffic_bytes: 0,
        }
    }

    pub fn with_mac(mut self, mac: impl AsRef<str>) -> Self {
        self.mac = Some(MacAddress::new(mac));
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_min_traffic(mut self, kilobytes: f64) -> Self {
        self.min_traffic_amount = Some(kilobytes);
        self
    }

    /// `false` when no identity field is configured; such a device can
    /// never match and stays offline.
    pub fn has_identity(&self) -> bool {
        self.mac.is_some() || self.ip.is_some() || self.hostname.is_some()
    }

    /// Whether presence must be qualified by a traffic sample.
    pub fn requires_traffic(&self) -> bool {
        self.min_traffic_amount.is_some_and(|kb| kb > 0.0)
    }

    /// Apply one cycle's observation, stamped with the current time.
    pub fn update(&mut self, matched: Option<&ClientRecord>, sample: Option<TrafficSample>) {
        self.update_at(matched, sample, Utc::now());
    }

    /// Apply one cycle's observation.
    ///
    /// Unmatched: offline, no location; `last_seen` and `traffic_bytes`
    /// keep their last known values. Matched: online at `now`, located at
    /// the client's association MAC. With a traffic threshold the sample
    /// (zero when missing) must reach it, or the device reads offline.
    #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
    pub fn update_at(
        &mut self,
        matched: Option<&ClientRecord>,
        sample: Option<TrafficSample>,
        now: DateTime<Utc>,
    ) {
        let Some(client) = matched else {
            self.online = false;
            self.current_location = None;
            return;
        };

        self.online = true;
        self.last_seen = Some(now);
        self.current_location = client.association_mac().map(MacAddress::new);

        if let Some(threshold) = self.min_traffic_amount.filter(|kb| *kb > 0.0) {
            self.traffic_bytes = sample.map_or(0, TrafficSample::total);
            let kilobytes = self.traffic_bytes as f64 / 1024.0;
            self.online = self.online && kilobytes >= threshold;
        }
    }
}

impl From<&DeviceConfig> for Device {
    fn from(cfg: &DeviceConfig) -> Self {
        Self {
            mac: non_blank(cfg.mac.as_deref()).map(MacAddress::new),
            ip: cfg.ip.clone().filter(|v| !v.trim().is_empty()),
            hostname: cfg.hostname.clone().filter(|v| !v.trim().is_empty()),
            min_traffic_amount: cfg.min_traffic_amount,
            ..Self::new(cfg.name.clone())
        }
    }
}

// ── Resident ────────────────────────────────────────────────────────

/// A person, present when any of their devices is online.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resident {
    pub id: String,
    pub name: String,
    pub devices: Vec<Device>,
    pub is_home: bool,
}

impl Resident {
    pub fn new(id: impl Into<String>, name: impl Into<String>, devices: Vec<Device>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            devices,
            is_home: false,
        }
    }

    pub fn from_config(id: impl Into<String>, cfg: &ResidentConfig) -> Self {
        Self::new(id, cfg.name.clone(), cfg.devices.iter().map(Device::from).collect())
    }

    /// Recompute `is_home`. Call after every device has been updated.
    pub fn refresh(&mut self) {
        self.is_home = self.devices.iter().any(|d| d.online);
    }

    /// Whether any device is associated with `mac`. A device held offline
    /// by its traffic threshold still counts.
    pub fn is_at(&self, mac: &MacAddress) -> bool {
        self.devices
            .iter()
            .any(|d| d.current_location.as_ref() == Some(mac))
    }

    /// "Home (Phone, Watch)" / "Away".
    pub fn summary(&self) -> String {
        let online: Vec<&str> = self
            .devices
            .iter()
            .filter(|d| d.online)
            .map(|d| d.name.as_str())
            .collect();
        if online.is_empty() {
            "Away".to_owned()
        } else {
            format!("Home ({})", online.join(", "))
        }
    }
}

/// Blank config strings mean "not configured".
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

// ── Location ────────────────────────────────────────────────────────

/// A WiFi point (access point or switch) used as a coarse locality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    /// Configured identity.
    pub mac: Option<MacAddress>,
    pub ip: Option<String>,
    /// MAC adopted from the matching access point record. `None` until a
    /// fetched access point matched.
    pub resolved_mac: Option<MacAddress>,
    pub occupied: bool,
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mac: None,
            ip: None,
            resolved_mac: None,
            occupied: false,
        }
    }

    pub fn with_mac(mut self, mac: impl AsRef<str>) -> Self {
        self.mac = Some(MacAddress::new(mac));
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn from_config(id: impl Into<String>, cfg: &LocationConfig) -> Self {
        let mut location = Self::new(id, cfg.name.clone());
        location.mac = non_blank(cfg.mac.as_deref()).map(MacAddress::new);
        location.ip = cfg.ip.clone().filter(|v| !v.trim().is_empty());
        location
    }

    /// Adopt the MAC of the first matching access point, once.
    pub fn resolve(&mut self, access_points: &[DeviceRecord]) {
        if self.resolved_mac.is_some() {
            return;
        }
        self.resolved_mac = access_points
            .iter()
            .find(|ap| matcher::matches_access_point(self, ap))
            .and_then(|ap| ap.mac.as_deref())
            .map(MacAddress::new);
    }

    /// Recompute `occupied` from the residents' device locations.
    pub fn refresh(&mut self, residents: &[Resident]) {
        self.occupied = match &self.resolved_mac {
            Some(mac) => residents.iter().any(|r| r.is_at(mac)),
            None => false,
        };
    }

    /// Names of residents with a device attached here.
    pub fn present<'a>(&self, residents: &'a [Resident]) -> Vec<&'a str> {
        let Some(mac) = &self.resolved_mac else {
            return Vec::new();
        };
        residents
            .iter()
            .filter(|r| r.is_at(mac))
            .map(|r| r.name.as_str())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client(mac: &str, ap: &str) -> ClientRecord {
        ClientRecord {
            mac: Some(mac.into()),
            ap_mac: Some(ap.into()),
            ..ClientRecord::default()
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    // ── Device ──────────────────────────────────────────────────────

    #[test]
    fn matched_device_goes_online_and_records_location() {
        let mut d = Device::new("Phone").with_mac("aa:bb:cc:dd:ee:ff");
        d.update_at(Some(&client("aa:bb:cc:dd:ee:ff", "11-22-33-44-55-66")), None, t(100));
        assert!(d.online);
        assert_eq!(d.last_seen, Some(t(100)));
        assert_eq!(
            d.current_location,
            Some(MacAddress::new("11:22:33:44:55:66"))
        );
    }

    #[test]
    fn unmatched_update_is_idempotent_and_keeps_history() {
        let mut d = Device::new("Phone").with_mac("aa:bb:cc:dd:ee:ff").with_min_traffic(1.0);
        d.update_at(
            Some(&client("aa:bb:cc:dd:ee:ff", "11:22:33:44:55:66")),
            Some(TrafficSample { rx: 4096, tx: 0 }),
            t(100),
        );
        assert!(d.online);

        d.update_at(None, None, t(200));
        let once = d.clone();
        d.update_at(None, None, t(300));

        assert_eq!(d, once);
        assert!(!d.online);
        assert_eq!(d.current_location, None);
        assert_eq!(d.last_seen, Some(t(100)));
        assert_eq!(d.traffic_bytes, 4096);
    }

    #[test]
    fn zero_traffic_forces_offline() {
        let mut d = Device::new("Phone").with_mac("aa:bb:cc:dd:ee:ff").with_min_traffic(50.0);
        d.update_at(
            Some(&client("aa:bb:cc:dd:ee:ff", "11:22:33:44:55:66")),
            Some(TrafficSample { rx: 0, tx: 0 }),
            t(1),
        );
        assert!(!d.online);
        assert_eq!(d.last_seen, Some(t(1)));
    }

    #[test]
    fn traffic_above_threshold_qualifies() {
        let mut d = Device::new("Phone").with_mac("aa:bb:cc:dd:ee:ff").with_min_traffic(50.0);
        d.update_at(
            Some(&client("aa:bb:cc:dd:ee:ff", "11:22:33:44:55:66")),
            Some(TrafficSample { rx: 40_000, tx: 12_000 }),
            t(1),
        );
        assert!(d.online);
        assert_eq!(d.traffic_bytes, 52_000);
    }

    #[test]
    fn traffic_below_threshold_disqualifies() {
        let mut d = Device::new("Phone").with_mac("aa:bb:cc:dd:ee:ff").with_min_traffic(50.0);
        d.update_at(
            Some(&client("aa:bb:cc:dd:ee:ff", "11:22:33:44:55:66")),
            Some(TrafficSample { rx: 30_000, tx: 0 }),
            t(1),
        );
        assert!(!d.online);
    }

    #[test]
    fn missing_sample_with_threshold_is_offline() {
        let mut d = Device::new("Phone").with_mac("aa:bb:cc:dd:ee:ff").with_min_traffic(50.0);
        d.traffic_bytes = 999_999;
        d.update_at(Some(&client("aa:bb:cc:dd:ee:ff", "x")), None, t(1));
        assert!(!d.online);
        assert_eq!(d.traffic_bytes, 0);
    }

    #[test]
    fn zero_threshold_ignores_traffic() {
        let mut d = Device::new("Phone").with_mac("aa:bb:cc:dd:ee:ff").with_min_traffic(0.0);
        d.update_at(Some(&client("aa:bb:cc:dd:ee:ff", "x")), None, t(1));
        assert!(d.online);
        assert!(!d.requires_traffic());
    }

    // ── Resident ────────────────────────────────────────────────────

    #[test]
    fn resident_is_home_when_any_device_online() {
        let mut a = Device::new("Phone");
        let mut b = Device::new("Watch");
        a.online = false;
        b.online = true;
        let mut r = Resident::new("resident:john", "John", vec![a.clone(), b]);
        r.refresh();
        assert!(r.is_home);
        assert_eq!(r.summary(), "Home (Watch)");

        let mut r = Resident::new("resident:john", "John", vec![a.clone(), a]);
        r.refresh();
        assert!(!r.is_home);
        assert_eq!(r.summary(), "Away");
    }

    // ── Location ────────────────────────────────────────────────────

    fn resident_at(name: &str, ap: &str) -> Resident {
        let mut d = Device::new("Phone");
        d.online = true;
        d.current_location = Some(MacAddress::new(ap));
        let mut r = Resident::new(format!("resident:{name}"), name, vec![d]);
        r.refresh();
        r
    }

    #[test]
    fn unresolved_location_is_never_occupied() {
        let mut loc = Location::new("location:lr", "Living Room").with_mac("11:22:33:44:55:66");
        loc.occupied = true;
        loc.refresh(&[resident_at("John", "11:22:33:44:55:66")]);
        assert!(!loc.occupied);
        assert!(loc.present(&[resident_at("John", "11:22:33:44:55:66")]).is_empty());
    }

    #[test]
    fn location_resolves_mac_from_ip_match() {
        let mut loc = Location::new("location:lr", "Living Room").with_ip("10.0.0.20");
        let aps = vec![
            DeviceRecord {
                mac: Some("AA:AA:AA:AA:AA:AA".into()),
                ip: Some("10.0.0.21".into()),
                ..DeviceRecord::default()
            },
            DeviceRecord {
                mac: Some("11-22-33-44-55-66".into()),
                ip: Some("10.0.0.20".into()),
                ..DeviceRecord::default()
            },
        ];
        loc.resolve(&aps);
        assert_eq!(loc.resolved_mac, Some(MacAddress::new("11:22:33:44:55:66")));

        let residents = [resident_at("John", "11:22:33:44:55:66"), resident_at("Jane", "aa:aa:aa:aa:aa:aa")];
        loc.refresh(&residents);
        assert!(loc.occupied);
        assert_eq!(loc.present(&residents), vec!["John"]);
    }

    #[test]
    fn resolved_mac_survives_empty_access_point_list() {
        let mut loc = Location::new("location:lr", "Living Room").with_mac("11:22:33:44:55:66");
        loc.resolve(&[DeviceRecord {
            mac: Some("11:22:33:44:55:66".into()),
            ..DeviceRecord::default()
        }]);
        loc.resolve(&[]);
        assert!(loc.resolved_mac.is_some());
    }

    #[test]
    fn device_below_threshold_still_occupies_its_location() {
        let mut d = Device::new("Tablet")
            .with_mac("01:02:03:04:05:06")
            .with_min_traffic(100.0);
        d.update_at(
            Some(&client("01:02:03:04:05:06", "11:22:33:44:55:66")),
            Some(TrafficSample { rx: 40_000, tx: 12_000 }),
            t(100),
        );
        assert!(!d.online);

        let mut jane = Resident::new("resident:jane", "Jane", vec![d]);
        jane.refresh();
        assert!(!jane.is_home);

        let mut loc = Location::new("location:lr", "Living Room").with_mac("11:22:33:44:55:66");
        loc.resolve(&[DeviceRecord {
            mac: Some("11:22:33:44:55:66".into()),
            ..DeviceRecord::default()
        }]);
        let residents = [jane];
        loc.refresh(&residents);
        assert!(loc.occupied);
        assert_eq!(loc.present(&residents), vec!["Jane"]);
    }

    // ── Config translation ──────────────────────────────────────────

    #[test]
    fn blank_config_mac_is_not_an_identity() {
        let d = Device::from(&DeviceConfig {
            name: "Laptop".into(),
            mac: Some("  ".into()),
            ip: Some("192.168.1.50".into()),
            ..DeviceConfig::default()
        });
        assert_eq!(d.mac, None);

        let seen = ClientRecord {
            mac: Some("aa:bb:cc:dd:ee:ff".into()),
            ip: Some("192.168.1.50".into()),
            ..ClientRecord::default()
        };
        assert!(matcher::matches_client(&d, &seen));
    }

    #[test]
    fn blank_location_mac_is_not_configured() {
        let loc = Location::from_config(
            "location:lr",
            &LocationConfig {
                name: "Living Room".into(),
                mac: Some(String::new()),
                ip: Some("10.0.0.20".into()),
            },
        );
        assert_eq!(loc.mac, None);
        assert_eq!(loc.ip.as_deref(), Some("10.0.0.20"));
    }
}
