//! State reconciliation between a cloud garage-door service and the
//! locally-exposed door snapshot.
//!
//! This crate owns the control-flow heart of doorsync:
//!
//! - **[`model`]** — the door-state enums and the pure mappings between
//!   remote tokens, local states, and gateway command shapes.
//!
//! - **[`SnapshotStore`]** — the shared current/target view, built on
//!   `tokio::sync::watch` so the presentation layer can subscribe to
//!   changes instead of polling.
//!
//! - **[`Bridge`]** — lifecycle facade. [`start()`](Bridge::start) seeds
//!   the snapshot from an initial fetch, then runs the reconciliation
//!   loop (regular interval plus an adaptive fast-poll while the door is
//!   mid-transition) and the command dispatcher. Accepted commands spawn
//!   bounded confirmation tasks that poll until the door reaches the
//!   commanded state or a deadline passes.
//!
//! - **[`StateGateway`]** — the seam to the remote service; implemented
//!   for [`doorsync_api::GarageClient`] and by scripted fakes in tests.

pub mod bridge;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod snapshot;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{CoreError, GatewayError, UnknownStateError};
pub use gateway::StateGateway;
pub use model::{CommandStyle, DoorState, GatewayCommand, TargetState};
pub use snapshot::{PendingCommand, SnapshotStore};
