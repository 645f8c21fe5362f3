// ── Startup address guesses ──
//
// Users often configure a controller address that is almost right: the
// wrong scheme, a missing management port, or the console root instead
// of its network proxy. These are tried once, at startup only.

use url::Url;

/// Addresses to try after `configured`, in order, without duplicates.
pub fn alternate_base_urls(configured: &Url) -> Vec<Url> {
    let Some(host) = configured.host_str() else {
        return Vec::new();
    };

    let guesses = [
        format!("https://{host}"),
        format!("https://{host}:8443"),
        format!("http://{host}:8080"),
        format!("https://{host}/proxy/network"),
    ];

    let mut out: Vec<Url> = Vec::with_capacity(guesses.len());
    for guess in guesses {
        let Ok(url) = Url::parse(&guess) else {
            continue;
        };
        if same_address(&url, configured) || out.iter().any(|u| same_address(u, &url)) {
            continue;
        }
        out.push(url);
    }
    out
}

/// Equal after ignoring a trailing slash on the path.
fn same_address(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
        && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
}
