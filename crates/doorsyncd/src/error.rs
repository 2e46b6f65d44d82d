//! Daemon startup errors with miette diagnostics.
//!
//! Everything here is fatal by definition: the bridge only starts with
//! a valid, authenticated gateway and a resolved device. Runtime
//! trouble after that point is logged by the core and never terminates
//! the process.

use miette::Diagnostic;
use thiserror::Error;

/// Exit codes for process termination.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum DaemonError {
    #[error("Configuration error")]
    #[diagnostic(
        code(doorsync::config),
        help(
            "Check the config file (doorsyncd --config <path>) and any\n\
             DOORSYNC_-prefixed environment variables."
        )
    )]
    Config(#[from] doorsync_config::ConfigError),

    #[error("Could not sign in to the garage door service")]
    #[diagnostic(
        code(doorsync::auth),
        help(
            "Verify username and password.\n\
             The password can come from password_env or the system keyring."
        )
    )]
    Auth(#[source] doorsync_api::Error),

    #[error("Could not reach the garage door service")]
    #[diagnostic(
        code(doorsync::connection),
        help("Check network connectivity and the configured service_url.")
    )]
    Connection(#[source] doorsync_api::Error),

    #[error("Device '{serial}' not found on this account")]
    #[diagnostic(
        code(doorsync::device_not_found),
        help("Doors on this account: {available}")
    )]
    DeviceNotFound { serial: String, available: String },

    #[error("Bridge failed to start")]
    #[diagnostic(code(doorsync::bridge))]
    Bridge(#[from] doorsync_core::CoreError),
}

impl DaemonError {
    /// Classify an API error from startup into auth vs. connection.
    pub fn from_api(err: doorsync_api::Error) -> Self {
        if matches!(err, doorsync_api::Error::Authentication { .. }) || err.is_auth_expired() {
            Self::Auth(err)
        } else {
            Self::Connection(err)
        }
    }

    /// Map this error to a process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => exit_code::CONFIG,
            Self::Auth(_) => exit_code::AUTH,
            Self::Connection(_) => exit_code::CONNECTION,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Bridge(_) => exit_code::GENERAL,
        }
    }
}
