// Gateway HTTP client
//
// Wraps `reqwest::Client` with service-specific URL construction, the
// security-token header, and error-body decoding. Endpoint methods live
// in `auth.rs` and `devices.rs` as inherent impls to keep this module
// focused on transport mechanics.

use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ApiErrorBody;
use crate::transport::TransportConfig;

/// Header carrying the session token obtained at login.
pub(crate) const SECURITY_TOKEN_HEADER: &str = "SecurityToken";

/// Raw HTTP client for the cloud garage-door service.
///
/// Holds the security token behind a `RwLock` so a single client can be
/// shared across the reconciliation loop and confirmation tasks without
/// external synchronization.
pub struct GarageClient {
    http: reqwest::Client,
    base_url: Url,
    security_token: RwLock<Option<String>>,
}

impl GarageClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the service root, e.g. `https://api.myqdevice.com`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            security_token: RwLock::new(None),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Used by tests to point at a mock server without TLS or the
    /// application-id header machinery.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: base_url.parse()?,
            security_token: RwLock::new(None),
        })
    }

    /// The service base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// True once `login()` has stored a session token.
    pub fn is_authenticated(&self) -> bool {
        self.security_token.read().is_ok_and(|t| t.is_some())
    }

    pub(crate) fn set_security_token(&self, token: String) {
        if let Ok(mut slot) = self.security_token.write() {
            *slot = Some(token);
        }
    }

    pub(crate) fn security_token(&self) -> Result<String, Error> {
        self.security_token
            .read()
            .ok()
            .and_then(|t| t.clone())
            .ok_or(Error::NotAuthenticated)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an API path relative to the service root.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET request and decode the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let token = self.security_token()?;

        let resp = self
            .http
            .get(url)
            .header(SECURITY_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::decode(resp).await
    }

    /// Send an authenticated PUT with a JSON body, discarding the
    /// response payload.
    pub(crate) async fn put(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("PUT {}", url);
        let token = self.security_token()?;

        let resp = self
            .http
            .put(url)
            .header(SECURITY_TOKEN_HEADER, token)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::api_error(status, resp).await)
    }

    /// Send an unauthenticated POST (login) and decode the response.
    pub(crate) async fn post_unauthenticated<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::api_error(status, resp).await);
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Build an `Error::Api` from a non-2xx response, pulling the
    /// message out of the service's error body when one is present.
    async fn api_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(ApiErrorBody::into_message)
            .unwrap_or(body);

        Error::Api {
            message,
            status: status.as_u16(),
        }
    }
}
