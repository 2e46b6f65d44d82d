// ── Runtime bridge configuration ──
//
// Describes *how* the bridge polls and commands one door. Built by the
// config crate (or tests) and handed in; the core never reads files.

use std::time::Duration;

use crate::model::CommandStyle;

/// Configuration for bridging a single door.
///
/// The interval/timeout defaults are the values observed in production
/// deployments; where deployments disagree (confirmation deadline,
/// target inference) the disagreement is a parameter here rather than a
/// hard-coded choice.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Device serial the gateway resolves state reads/writes against.
    pub device_id: String,

    /// Regular reconciliation interval.
    pub poll_interval: Duration,

    /// Follow-up interval while the door is mid-transition.
    pub fast_poll_interval: Duration,

    /// Delay between confirmation polls after a command. Also the grace
    /// delay before the first re-check, since the service is known to
    /// report stale state immediately after accepting a command.
    pub confirm_interval: Duration,

    /// How long a confirmation sequence keeps polling before giving up
    /// and leaving the door to the regular loop.
    pub confirm_timeout: Duration,

    /// Which command shape this deployment's gateway expects.
    pub command_style: CommandStyle,

    /// Whether the reconciliation loop passively infers the target from
    /// observed state. Deployments whose service reports transitional
    /// states enable this; ones that only report terminal states leave
    /// target updates to command confirmation.
    pub target_inference: bool,

    /// Command intake queue depth. A full queue drops new requests
    /// rather than blocking the presentation layer.
    pub command_queue_depth: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            poll_interval: Duration::from_secs(300),
            fast_poll_interval: Duration::from_secs(5),
            confirm_interval: Duration::from_secs(5),
            confirm_timeout: Duration::from_secs(60),
            command_style: CommandStyle::default(),
            target_inference: true,
            command_queue_depth: 8,
        }
    }
}
