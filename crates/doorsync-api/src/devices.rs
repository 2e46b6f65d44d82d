// Device endpoints
//
// Enumeration, single-door state reads, and the two command shapes the
// service supports: a desired-state attribute write and an action verb.

use serde_json::json;
use tracing::debug;

use crate::client::GarageClient;
use crate::error::Error;
use crate::models::{Device, DeviceList};

impl GarageClient {
    /// List all devices registered to the account.
    ///
    /// `GET /api/v5.1/Devices`. Includes non-door devices (gateway hubs
    /// and the like); filter with [`Device::is_door`].
    pub async fn devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.api_url("api/v5.1/Devices")?;
        debug!("listing devices");
        let list: DeviceList = self.get(url).await?;
        debug!(count = list.count, "device list fetched");
        Ok(list.items)
    }

    /// Fetch a single device by serial number.
    ///
    /// `GET /api/v5.1/Devices/{serial}`
    pub async fn device(&self, serial: &str) -> Result<Device, Error> {
        let url = self.api_url(&format!("api/v5.1/Devices/{serial}"))?;
        self.get(url).await.map_err(|e| match e {
            Error::Api { status: 404, .. } => Error::DeviceNotFound {
                serial: serial.to_owned(),
            },
            other => other,
        })
    }

    /// Fetch the raw door-state token for one device.
    ///
    /// Returns the service's string token (`"open"`, `"closed"`, ...)
    /// untouched; mapping to the local model is the core's job.
    pub async fn door_state(&self, serial: &str) -> Result<String, Error> {
        let device = self.device(serial).await?;
        device
            .state
            .door_state
            .ok_or_else(|| Error::MissingDoorState {
                serial: serial.to_owned(),
            })
    }

    /// Command a door by writing the desired-state attribute.
    ///
    /// `PUT /api/v5.1/Devices/{serial}/state` with
    /// `{"attribute_name": "desireddoorstate", "value": <state token>}`.
    /// Older deployments expect this shape.
    pub async fn set_desired_state(&self, serial: &str, state_token: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("api/v5.1/Devices/{serial}/state"))?;
        debug!(serial, state_token, "setting desired door state");
        self.put(
            url,
            &json!({
                "attribute_name": "desireddoorstate",
                "value": state_token,
            }),
        )
        .await
        .map_err(Self::map_missing_device(serial))
    }

    /// Command a door with an action verb.
    ///
    /// `PUT /api/v5.1/Devices/{serial}/actions` with
    /// `{"action_type": "open" | "close"}`. Newer deployments expect
    /// this shape.
    pub async fn send_door_action(&self, serial: &str, action: &str) -> Result<(), Error> {
        let url = self.api_url(&format!("api/v5.1/Devices/{serial}/actions"))?;
        debug!(serial, action, "sending door action");
        self.put(url, &json!({ "action_type": action }))
            .await
            .map_err(Self::map_missing_device(serial))
    }

    fn map_missing_device(serial: &str) -> impl FnOnce(Error) -> Error {
        let serial = serial.to_owned();
        move |e| match e {
            Error::Api { status: 404, .. } => Error::DeviceNotFound { serial },
            other => other,
        }
    }
}
