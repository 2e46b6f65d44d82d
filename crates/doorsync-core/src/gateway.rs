// ── Remote state gateway seam ──
//
// The bridge talks to the cloud through this trait so tests can script
// a fake gateway with paused time. Static dispatch: the bridge is
// generic over the gateway, no boxing.

use std::future::Future;

use doorsync_api::GarageClient;

use crate::error::GatewayError;
use crate::model::GatewayCommand;

/// Read/write access to one door's remote state.
///
/// Implementations must be safe for concurrent invocation from the
/// reconciliation loop and any number of confirmation tasks.
pub trait StateGateway: Send + Sync + 'static {
    /// Fetch the raw state token for a device.
    fn fetch_state(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send;

    /// Issue a door command.
    fn send_command(
        &self,
        device_id: &str,
        command: GatewayCommand,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

impl<G: StateGateway> StateGateway for std::sync::Arc<G> {
    fn fetch_state(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<String, GatewayError>> + Send {
        (**self).fetch_state(device_id)
    }

    fn send_command(
        &self,
        device_id: &str,
        command: GatewayCommand,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        (**self).send_command(device_id, command)
    }
}

impl StateGateway for GarageClient {
    async fn fetch_state(&self, device_id: &str) -> Result<String, GatewayError> {
        Ok(self.door_state(device_id).await?)
    }

    async fn send_command(
        &self,
        device_id: &str,
        command: GatewayCommand,
    ) -> Result<(), GatewayError> {
        match command {
            GatewayCommand::StateName(state) => self.set_desired_state(device_id, state).await?,
            GatewayCommand::Action(action) => self.send_door_action(device_id, action).await?,
        }
        Ok(())
    }
}
