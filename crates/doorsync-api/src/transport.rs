// Shared transport configuration for building reqwest::Client instances.
//
// The gateway client takes its timeout and application-id header from
// here, keeping the builder logic out of the endpoint modules.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::error::Error;

/// Application identifier sent with every request.
///
/// The service rejects requests without it; it identifies the client
/// software, not the user.
pub const APP_ID_HEADER: &str = "MyQApplicationId";

const DEFAULT_APP_ID: &str = "JVM/G9Nwih5BwKgNCjLxiFUQxQijAebyyg8QUHr7JOrP+tuPb8iHfRHKwTmDzHOu";

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub app_id: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            app_id: DEFAULT_APP_ID.to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// The application-id header rides along on every request; the
    /// security token is injected per-request by the client after login.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        let app_id = HeaderValue::from_str(&self.app_id).map_err(|_| Error::Authentication {
            message: "application id contains invalid header characters".into(),
        })?;
        headers.insert(APP_ID_HEADER, app_id);

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("doorsync/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(client)
    }
}
