// Raw controller record types
//
// Controllers disagree on field presence across firmware generations, so
// every field is optional and `#[serde(default)]` is used liberally.
// Unknown fields land in `extra` for diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

// ── Envelope ─────────────────────────────────────────────────────────

/// Strip the optional `{ "data": ... }` wrapper.
///
/// Legacy endpoints wrap payloads as `{ meta, data }`, v2 and cloud
/// endpoints sometimes return the payload bare. `data` wins when present.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Reject HTTP-200 bodies that are really errors.
///
/// Legacy controllers report `{"meta": {"rc": "error", "msg": ...}}`;
/// gateway-OS consoles use `{"error": {"code": N, "message": ...}}`.
pub(crate) fn check_error_envelope(value: &Value) -> Result<(), Error> {
    if let Some(meta) = value.get("meta") {
        let rc = meta.get("rc").and_then(Value::as_str).unwrap_or("ok");
        if rc != "ok" {
            let message = meta
                .get("msg")
                .and_then(Value::as_str)
                .map_or_else(|| format!("rc={rc}"), str::to_owned);
            return Err(Error::Api { message });
        }
    }
    if let Some(err) = value.get("error").filter(|e| e.is_object()) {
        let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
        let message = err
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(Error::Api {
            message: format!("gateway error {code}: {message}"),
        });
    }
    Ok(())
}

/// Unwrap a payload that must be a list and decode its entries.
pub(crate) fn decode_list<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>, Error> {
    let payload = unwrap_envelope(value);
    let payload = match payload {
        // v2 device listing: { "network_devices": [...], ... }
        Value::Object(mut map) if map.contains_key("network_devices") => {
            map.remove("network_devices").unwrap_or(Value::Null)
        }
        other => other,
    };
    if !payload.is_array() {
        let body = payload.to_string();
        return Err(Error::Deserialization {
            message: "expected a JSON array payload".into(),
            body,
        });
    }
    serde_json::from_value(payload.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: payload.to_string(),
    })
}

// ── Client (station) ─────────────────────────────────────────────────

/// One connected network client as the controller reports it.
///
/// Legacy `stat/sta` fills `hostname`/`name`, the v2 active-clients
/// listing fills `display_name`; the association to an access point is
/// spread over several fields depending on generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub ap_mac: Option<String>,
    #[serde(default)]
    pub sw_mac: Option<String>,
    #[serde(default)]
    pub uplink_mac: Option<String>,
    #[serde(default)]
    pub last_uplink_mac: Option<String>,
    #[serde(default)]
    pub is_wired: Option<bool>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ClientRecord {
    /// MAC of the access point / switch this client hangs off, in
    /// priority order `ap_mac`, `sw_mac`, `uplink_mac`, `last_uplink_mac`.
    pub fn association_mac(&self) -> Option<&str> {
        [
            &self.ap_mac,
            &self.sw_mac,
            &self.uplink_mac,
            &self.last_uplink_mac,
        ]
        .into_iter()
        .filter_map(Option::as_deref)
        .map(str::trim)
        .find(|v| !v.is_empty())
    }
}

// ── Network device (access point / switch) ───────────────────────────

/// A managed network device. Presence only needs identity fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Traffic ──────────────────────────────────────────────────────────

/// Bytes moved by one client over the short report window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficSample {
    pub rx: u64,
    pub tx: u64,
}

impl TrafficSample {
    pub fn total(self) -> u64 {
        self.rx.saturating_add(self.tx)
    }
}

/// One bucket from `stat/report/5minutes.user`.
#[derive(Debug, Deserialize)]
pub(crate) struct TrafficBucket {
    #[serde(default)]
    pub rx_bytes: Option<f64>,
    #[serde(default)]
    pub tx_bytes: Option<f64>,
}

impl TrafficSample {
    /// Sum report buckets. Controllers emit byte counters as floats.
    #[allow(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub(crate) fn from_buckets(buckets: &[TrafficBucket]) -> Self {
        let sum = |f: fn(&TrafficBucket) -> Option<f64>| -> u64 {
            buckets
                .iter()
                .filter_map(f)
                .filter(|v| v.is_finite() && *v > 0.0)
                .sum::<f64>() as u64
        };
        Self {
            rx: sum(|b| b.rx_bytes),
            tx: sum(|b| b.tx_bytes),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwrap_prefers_data_property() {
        let v = json!({ "meta": { "rc": "ok" }, "data": [1, 2] });
        assert_eq!(unwrap_envelope(v), json!([1, 2]));
    }

    #[test]
    fn unwrap_passes_bare_payload_through() {
        let v = json!([{ "mac": "aa" }]);
        assert_eq!(unwrap_envelope(v.clone()), v);
    }

    #[test]
    fn legacy_error_envelope_is_rejected() {
        let v = json!({ "meta": { "rc": "error", "msg": "api.err.NoSiteContext" }, "data": [] });
        let err = check_error_envelope(&v).unwrap_err();
        assert!(err.to_string().contains("NoSiteContext"));
    }

    #[test]
    fn gateway_error_envelope_is_rejected() {
        let v = json!({ "error": { "code": 401, "message": "Unauthorized" } });
        assert!(matches!(check_error_envelope(&v), Err(Error::Api { .. })));
    }

    #[test]
    fn decode_list_requires_array() {
        let result: Result<Vec<ClientRecord>, _> = decode_list(json!({ "data": { "x": 1 } }));
        assert!(matches!(result, Err(Error::Deserialization { .. })));
    }

    #[test]
    fn decode_list_flattens_v2_devices() {
        let v = json!({ "network_devices": [{ "mac": "11:22:33:44:55:66", "type": "uap" }] });
        let devices: Vec<DeviceRecord> = decode_list(v).unwrap();
        assert_eq!(devices[0].device_type.as_deref(), Some("uap"));
    }

    #[test]
    fn association_prefers_ap_then_switch() {
        let client = ClientRecord {
            ap_mac: Some(String::new()),
            sw_mac: Some("aa:aa:aa:aa:aa:aa".into()),
            uplink_mac: Some("bb:bb:bb:bb:bb:bb".into()),
            ..ClientRecord::default()
        };
        assert_eq!(client.association_mac(), Some("aa:aa:aa:aa:aa:aa"));
    }

    #[test]
    fn association_falls_back_to_last_uplink() {
        let client = ClientRecord {
            last_uplink_mac: Some("cc:cc:cc:cc:cc:cc".into()),
            ..ClientRecord::default()
        };
        assert_eq!(client.association_mac(), Some("cc:cc:cc:cc:cc:cc"));
    }

    #[test]
    fn traffic_buckets_are_summed() {
        let buckets: Vec<TrafficBucket> = serde_json::from_value(json!([
            { "rx_bytes": 1000.0, "tx_bytes": 24.0, "time": 1 },
            { "rx_bytes": 500.5, "time": 2 },
        ]))
        .unwrap();
        let sample = TrafficSample::from_buckets(&buckets);
        assert_eq!(sample.rx, 1500);
        assert_eq!(sample.tx, 24);
        assert_eq!(sample.total(), 1524);
    }
}
