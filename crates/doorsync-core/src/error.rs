// ── Core error types ──
//
// Domain-level errors. Consumers never see HTTP status codes or JSON
// parse failures directly; the `From<doorsync_api::Error>` impl folds
// transport detail into the three shapes the bridge cares about.

use thiserror::Error;

pub use crate::model::UnknownStateError;

/// Failure from the remote state gateway, as the bridge sees it.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Worth retrying on the next timer fire. Never fatal once the
    /// bridge is running.
    #[error("transient gateway error: {0}")]
    Transient(String),

    /// The gateway understood the request and said no.
    #[error("gateway rejected the request: {0}")]
    Rejected(String),

    /// The device identifier is unknown to the account.
    #[error("device not found: {0}")]
    DeviceNotFound(String),
}

impl From<doorsync_api::Error> for GatewayError {
    fn from(err: doorsync_api::Error) -> Self {
        match err {
            doorsync_api::Error::DeviceNotFound { serial } => Self::DeviceNotFound(serial),
            e if e.is_transient() => Self::Transient(e.to_string()),
            e => Self::Rejected(e.to_string()),
        }
    }
}

/// Errors surfaced by the bridge itself.
///
/// Only startup can fail: once running, fetch and command errors are
/// logged and absorbed per the reconciliation policy.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The very first fetch returned a token the model does not know.
    /// Mid-run this is a soft warning, but at startup there is no
    /// previous value to retain.
    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),

    /// `start()` called twice, or after `shutdown()`.
    #[error("bridge already started")]
    AlreadyStarted,
}
