// Local controller HTTP client
//
// Wraps `reqwest::Client` with discovery-aware URL construction and
// uniform failure classification. Resource operations live in sibling
// modules as inherent methods to keep this file focused on transport.

use std::sync::{PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::local::discovery::{self, BackendProfile, Endpoint, Resource};
use crate::models::{check_error_envelope, decode_list};
use crate::transport::TransportConfig;

/// Longest slice of an error body kept for diagnostics.
const BODY_PREVIEW: usize = 200;

/// Client for a gateway-OS console or classic controller.
///
/// Owns the session's discovered [`BackendProfile`]. The profile only
/// changes inside discovery and is never held across an await.
pub struct LocalClient {
    http: reqwest::Client,
    base_url: Url,
    site: String,
    profile: RwLock<BackendProfile>,
}

impl LocalClient {
    /// Create a client that authenticates with the local API-key header.
    pub fn new(
        base_url: Url,
        site: String,
        api_key: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client(crate::auth::LOCAL_API_KEY_HEADER, api_key)?;
        Ok(Self::with_client(http, base_url, site))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, site: String) -> Self {
        Self {
            http,
            base_url,
            site,
            profile: RwLock::new(BackendProfile::default()),
        }
    }

    /// Same credentials and site, different controller address. The
    /// discovered profile is not carried over.
    pub fn with_base_url(&self, base_url: Url) -> Self {
        Self::with_client(self.http.clone(), base_url, self.site.clone())
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Snapshot of what discovery has learned so far.
    pub fn profile(&self) -> BackendProfile {
        *self
            .profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn update_profile(&self, f: impl FnOnce(&mut BackendProfile)) {
        let mut guard = self
            .profile
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    // ── Discovery ────────────────────────────────────────────────────

    /// Fetch a list resource, discovering its endpoint on first use.
    ///
    /// A remembered endpoint is used directly. If it fails the failure is
    /// returned for this call and the endpoint is forgotten, so the next
    /// call probes the candidate list again.
    pub(crate) async fn discover<T: DeserializeOwned>(
        &self,
        resource: Resource,
    ) -> Result<Vec<T>, Error> {
        let profile = self.profile();

        if let Some(endpoint) = profile.endpoint(resource) {
            trace!(path = %endpoint.display_path(&self.site), "using remembered endpoint");
            return match self.fetch_list(endpoint).await {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!(
                        resource = resource.name(),
                        path = %endpoint.display_path(&self.site),
                        error = %e,
                        "remembered endpoint failed; will rediscover next cycle"
                    );
                    self.update_profile(|p| p.forget(resource));
                    Err(e)
                }
            };
        }

        for endpoint in discovery::candidates(resource, &self.base_url, profile.prefix) {
            match self.fetch_list(endpoint).await {
                Ok(items) => {
                    debug!(
                        resource = resource.name(),
                        path = %endpoint.display_path(&self.site),
                        "discovered endpoint"
                    );
                    self.update_profile(|p| p.remember(resource, endpoint));
                    return Ok(items);
                }
                Err(e) => {
                    debug!(
                        resource = resource.name(),
                        path = %endpoint.display_path(&self.site),
                        error = %e,
                        "candidate endpoint rejected"
                    );
                }
            }
        }

        Err(Error::NoEndpoint {
            resource: resource.name(),
        })
    }

    async fn fetch_list<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<Vec<T>, Error> {
        let url = endpoint.url(&self.base_url, &self.site)?;
        let value = self.get(url).await?;
        decode_list(value)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET and return the parsed JSON body.
    pub(crate) async fn get(&self, url: Url) -> Result<Value, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }

    /// Send a POST with a JSON body and return the parsed JSON body.
    pub(crate) async fn post(&self, url: Url, body: &Value) -> Result<Value, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        parse_response(resp).await
    }

    /// Resolve a path against the base URL with an explicit prefix.
    pub(crate) fn url_for(&self, prefix: &'static str, path: &'static str) -> Result<Url, Error> {
        Endpoint { prefix, path }.url(&self.base_url, &self.site)
    }
}

/// Classify one HTTP exchange: status >= 400, unparsable body, and
/// error envelopes all become `Err`.
async fn parse_response(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();

    if status.is_client_error() || status.is_server_error() {
        let raw = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            status: status.as_u16(),
            body: error_text(&raw),
        });
    }

    let body = resp.text().await?;
    let value: Value = serde_json::from_str(&body).map_err(|e| {
        let preview = preview(&body);
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })?;

    check_error_envelope(&value)?;
    Ok(value)
}

/// Error bodies are diagnostic text. Pull a message out of JSON bodies
/// when there is one; otherwise keep a bounded preview.
fn error_text(raw: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        let message = value
            .get("message")
            .or_else(|| value.pointer("/meta/msg"))
            .or_else(|| value.pointer("/error/message"))
            .and_then(Value::as_str);
        if let Some(message) = message {
            return message.to_owned();
        }
    }
    preview(raw).to_owned()
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_text_prefers_json_message() {
        assert_eq!(error_text(r#"{"message":"Not Found"}"#), "Not Found");
        assert_eq!(
            error_text(r#"{"meta":{"rc":"error","msg":"api.err.LoginRequired"}}"#),
            "api.err.LoginRequired"
        );
    }

    #[test]
    fn error_text_bounds_html_bodies() {
        let html = "<html>".repeat(100);
        assert_eq!(error_text(&html).chars().count(), BODY_PREVIEW);
    }
}
