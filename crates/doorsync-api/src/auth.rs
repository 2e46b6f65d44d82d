// Authentication
//
// Token-based login. The login endpoint returns a security token which
// is stored on the client and sent as a header on every subsequent
// request. Tokens expire server-side; callers re-login on 401.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::GarageClient;
use crate::error::Error;
use crate::models::LoginResponse;

impl GarageClient {
    /// Authenticate with the service using username/password.
    ///
    /// `POST /api/v5/Login`. On success the returned security token is
    /// stored and used for all subsequent requests.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.api_url("api/v5/Login")?;
        debug!("logging in at {}", url);

        let body = json!({
            "Username": username,
            "Password": password.expose_secret(),
        });

        let resp: LoginResponse =
            self.post_unauthenticated(url, &body)
                .await
                .map_err(|e| match e {
                    // The service answers bad credentials with 401/403;
                    // surface those as authentication failures rather
                    // than generic API errors.
                    Error::Api { message, status } if status == 401 || status == 403 => {
                        Error::Authentication { message }
                    }
                    other => other,
                })?;

        self.set_security_token(resp.security_token);
        debug!("login successful");
        Ok(())
    }
}
