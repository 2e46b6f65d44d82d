//! Async client for the cloud garage-door controller service.
//!
//! Transport-only: this crate authenticates, enumerates devices, reads a
//! door's raw state token, and issues door commands. It knows nothing
//! about the local door-state model or polling policy — that lives in
//! `doorsync-core`.
//!
//! Two command shapes exist across service deployments and both are
//! exposed: [`GarageClient::set_desired_state`] (desired-state attribute
//! write) and [`GarageClient::send_door_action`] (action verb). Which
//! one a given door expects is configuration, not something this crate
//! decides.

mod auth;
mod client;
mod devices;
mod error;
mod models;
mod transport;

pub use client::GarageClient;
pub use error::Error;
pub use models::{Device, DeviceState};
pub use transport::TransportConfig;
