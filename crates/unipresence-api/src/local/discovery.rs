// Endpoint discovery for local controllers
//
// The product generation behind a local address is not known up front:
// gateway-OS consoles proxy the Network application under
// `/proxy/network`, classic controllers serve it at the root, and the
// resource paths moved between firmware releases. Each resource has a
// fixed, ordered candidate list; the first candidate that answers with a
// well-formed list is remembered in the session's `BackendProfile`.

use url::Url;

use crate::error::Error;

/// Path segment under which gateway-OS consoles proxy the Network app.
pub const GATEWAY_PROXY_PREFIX: &str = "/proxy/network";

/// Prefixes tried in order when the base URL carries no proxy segment.
const PREFIXES: [&str; 2] = [GATEWAY_PROXY_PREFIX, ""];

/// Active-client listing paths, newest firmware first.
pub const CLIENT_PATHS: &[&str] = &[
    "v2/api/site/{site}/clients/active",
    "api/s/{site}/stat/sta",
    "api/s/{site}/stat/alluser",
    "api/stat/sta",
];

/// Network-device listing paths.
pub const DEVICE_PATHS: &[&str] = &[
    "api/s/{site}/stat/device",
    "v2/api/site/{site}/device",
    "api/stat/device",
];

/// Short-window traffic report (POST).
pub const TRAFFIC_PATH: &str = "api/s/{site}/stat/report/5minutes.user";

/// Raw client list used as the last-resort connectivity probe.
pub const RAW_CLIENTS_PATH: &str = "api/s/{site}/stat/sta";

/// A discoverable controller resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Clients,
    Devices,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Self::Clients => "active clients",
            Self::Devices => "network devices",
        }
    }

    pub fn paths(self) -> &'static [&'static str] {
        match self {
            Self::Clients => CLIENT_PATHS,
            Self::Devices => DEVICE_PATHS,
        }
    }
}

/// One concrete request target: a path prefix plus a resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub prefix: &'static str,
    pub path: &'static str,
}

impl Endpoint {
    /// Resolve against the controller base URL and site.
    pub fn url(&self, base_url: &Url, site: &str) -> Result<Url, Error> {
        let base = base_url.as_str().trim_end_matches('/');
        let path = self.path.replace("{site}", site);
        Ok(Url::parse(&format!("{base}{}/{path}", self.prefix))?)
    }

    /// The path relative to the host, for logs and tests.
    pub fn display_path(&self, site: &str) -> String {
        format!("{}/{}", self.prefix, self.path.replace("{site}", site))
    }
}

/// What discovery has learned about a session's controller.
///
/// Empty until the first successful call; cleared per resource when a
/// remembered endpoint stops answering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendProfile {
    /// Path prefix that answered first (`/proxy/network` or empty).
    pub prefix: Option<&'static str>,
    pub clients: Option<Endpoint>,
    pub devices: Option<Endpoint>,
}

impl BackendProfile {
    pub fn endpoint(&self, resource: Resource) -> Option<Endpoint> {
        match resource {
            Resource::Clients => self.clients,
            Resource::Devices => self.devices,
        }
    }

    pub fn remember(&mut self, resource: Resource, endpoint: Endpoint) {
        self.prefix = Some(endpoint.prefix);
        match resource {
            Resource::Clients => self.clients = Some(endpoint),
            Resource::Devices => self.devices = Some(endpoint),
        }
    }

    pub fn forget(&mut self, resource: Resource) {
        match resource {
            Resource::Clients => self.clients = None,
            Resource::Devices => self.devices = None,
        }
        if self.clients.is_none() && self.devices.is_none() {
            self.prefix = None;
        }
    }
}

/// Path prefixes to try for a base URL, in order.
///
/// A base URL that already ends in the proxy segment gets no second
/// prefix; a prefix learned from another resource is tried first.
pub fn prefixes(base_url: &Url, known: Option<&'static str>) -> Vec<&'static str> {
    let already_proxied = base_url
        .path()
        .trim_end_matches('/')
        .ends_with(GATEWAY_PROXY_PREFIX);
    if already_proxied {
        return vec![""];
    }
    let mut out: Vec<&'static str> = Vec::with_capacity(PREFIXES.len());
    if let Some(p) = known {
        out.push(p);
    }
    for p in PREFIXES {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// The full, ordered candidate list for a resource (prefix-major).
pub fn candidates(
    resource: Resource,
    base_url: &Url,
    known_prefix: Option<&'static str>,
) -> Vec<Endpoint> {
    prefixes(base_url, known_prefix)
        .into_iter()
        .flat_map(|prefix| {
            resource
                .paths()
                .iter()
                .map(move |&path| Endpoint { prefix, path })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn client_candidates_are_prefix_major() {
        let list = candidates(Resource::Clients, &url("https://10.0.0.1"), None);
        let paths: Vec<String> = list.iter().map(|e| e.display_path("default")).collect();
        assert_eq!(
            paths,
            vec![
                "/proxy/network/v2/api/site/default/clients/active",
                "/proxy/network/api/s/default/stat/sta",
                "/proxy/network/api/s/default/stat/alluser",
                "/proxy/network/api/stat/sta",
                "/v2/api/site/default/clients/active",
                "/api/s/default/stat/sta",
                "/api/s/default/stat/alluser",
                "/api/stat/sta",
            ]
        );
    }

    #[test]
    fn proxied_base_skips_second_prefix() {
        let list = candidates(
            Resource::Devices,
            &url("https://10.0.0.1/proxy/network/"),
            None,
        );
        assert_eq!(list.len(), DEVICE_PATHS.len());
        assert!(list.iter().all(|e| e.prefix.is_empty()));
    }

    #[test]
    fn known_prefix_is_tried_first() {
        assert_eq!(prefixes(&url("https://c:8443"), Some("")), vec!["", "/proxy/network"]);
    }

    #[test]
    fn endpoint_url_substitutes_site() {
        let e = Endpoint {
            prefix: GATEWAY_PROXY_PREFIX,
            path: "api/s/{site}/stat/sta",
        };
        let u = e.url(&url("https://udm.local/"), "home").unwrap();
        assert_eq!(u.as_str(), "https://udm.local/proxy/network/api/s/home/stat/sta");
    }

    #[test]
    fn forgetting_last_endpoint_clears_prefix() {
        let mut profile = BackendProfile::default();
        let e = Endpoint {
            prefix: "",
            path: CLIENT_PATHS[1],
        };
        profile.remember(Resource::Clients, e);
        assert_eq!(profile.prefix, Some(""));
        profile.forget(Resource::Clients);
        assert_eq!(profile, BackendProfile::default());
    }
}
