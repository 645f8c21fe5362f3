// ── MAC address identity ──
//
// Controllers, cloud inventories and hand-written config all spell MACs
// differently. Everything is compared in one canonical form.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from any common format.
    /// Accepts colon-separated, dash-separated, Cisco dotted, or bare hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        let is_separator = |c: char| matches!(c, ':' | '-' | '.');
        let hex: String = raw.chars().filter(|c| !is_separator(*c)).collect();

        if hex.len() == 12 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let lower = hex.to_ascii_lowercase();
            let octets: Vec<&str> = (0..6)
                .filter_map(|i| lower.get(i * 2..i * 2 + 2))
                .collect();
            return Self(octets.join(":"));
        }

        Self(raw.to_lowercase().replace('-', ":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}
