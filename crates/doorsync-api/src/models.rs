// Wire types for the cloud service.
//
// Only the fields the bridge actually consumes are modeled; the service
// sends considerably more, which serde ignores.

use serde::Deserialize;

/// A device registered to the account.
#[derive(Debug, Clone, Deserialize)]
pub struct Device {
    pub serial_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub device_family: Option<String>,
    #[serde(default)]
    pub device_model: Option<String>,
    #[serde(default)]
    pub state: DeviceState,
}

impl Device {
    /// True if this device is a garage-door opener (as opposed to the
    /// gateway hub or a lamp module that shares the account).
    pub fn is_door(&self) -> bool {
        self.device_family.as_deref() == Some("garagedoor") || self.state.door_state.is_some()
    }
}

/// Reported state attributes for a device.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceState {
    /// Raw door-state token, e.g. `"open"`, `"closed"`, `"opening"`.
    /// Absent on non-door devices.
    #[serde(default)]
    pub door_state: Option<String>,

    #[serde(default)]
    pub online: Option<bool>,

    /// Service-side timestamp of the last state change (RFC 3339).
    #[serde(default)]
    pub last_update: Option<String>,
}

/// `GET /api/v5.1/Devices` response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct DeviceList {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub items: Vec<Device>,
}

/// `POST /api/v5/Login` response.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(rename = "SecurityToken")]
    pub security_token: String,
}

/// Error body the service returns on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.description)
    }
}
