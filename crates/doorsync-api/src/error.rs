use thiserror::Error;

/// Top-level error type for the `doorsync-api` crate.
///
/// Covers every failure mode of the cloud gateway: authentication,
/// transport, structured API errors, and payload decoding.
/// `doorsync-core` maps these into domain-level gateway errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A call that requires a security token was made before login.
    #[error("Not authenticated -- call login() first")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Structured error response from the service.
    #[error("API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    /// The requested device serial is unknown to the account.
    #[error("Device not found: {serial}")]
    DeviceNotFound { serial: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Device payload is missing the door-state attribute.
    #[error("Device {serial} reported no door state")]
    MissingDoorState { serial: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying
    /// on the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this error indicates the session has expired
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::Api { status: 401, .. }
        )
    }
}
