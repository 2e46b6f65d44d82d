// ── Door-state model ──
//
// Pure mappings between the service's raw state tokens, the local door
// model, and the command shapes a gateway accepts. No I/O here.

use std::fmt;

use thiserror::Error;

/// A remote state token the local model does not recognize.
///
/// Soft condition: callers keep the previous snapshot value and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown door state token: {token:?}")]
pub struct UnknownStateError {
    pub token: String,
}

/// Observable door state.
///
/// Not every deployment reports all five — some services only ever send
/// `open`/`closed`/`stopped` and skip the transitional pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorState {
    Open,
    Closed,
    Opening,
    Closing,
    Stopped,
}

impl DoorState {
    /// Map a raw remote token onto the local model.
    ///
    /// Total and deterministic over the recognized token set; matching
    /// is ASCII case-insensitive because the service is not consistent
    /// about casing across firmware versions.
    pub fn from_token(token: &str) -> Result<Self, UnknownStateError> {
        if token.eq_ignore_ascii_case("open") {
            Ok(Self::Open)
        } else if token.eq_ignore_ascii_case("closed") {
            Ok(Self::Closed)
        } else if token.eq_ignore_ascii_case("opening") {
            Ok(Self::Opening)
        } else if token.eq_ignore_ascii_case("closing") {
            Ok(Self::Closing)
        } else if token.eq_ignore_ascii_case("stopped") {
            Ok(Self::Stopped)
        } else {
            Err(UnknownStateError {
                token: token.to_owned(),
            })
        }
    }

    /// The canonical lowercase token for this state.
    pub fn as_token(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Stopped => "stopped",
        }
    }

    /// True for states known to be temporary. A transitional state
    /// prompts the reconciliation loop to poll faster.
    pub fn is_transitional(self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    /// The target this state implies, if any.
    ///
    /// `Stopped` implies nothing: the door halted partway and the
    /// commanded intent is unknowable from observation alone.
    pub fn implied_target(self) -> Option<TargetState> {
        match self {
            Self::Open | Self::Opening => Some(TargetState::Open),
            Self::Closed | Self::Closing => Some(TargetState::Closed),
            Self::Stopped => None,
        }
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Commanded intent: always binary, never transitional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Open,
    Closed,
}

impl TargetState {
    /// The terminal door state that confirms this command.
    pub fn terminal_state(self) -> DoorState {
        match self {
            Self::Open => DoorState::Open,
            Self::Closed => DoorState::Closed,
        }
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.terminal_state().as_token())
    }
}

/// Which command shape the gateway expects. Fixed per deployment at
/// configuration time, never discovered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandStyle {
    /// Write the desired state by name (`"open"` / `"closed"`).
    #[default]
    StateName,
    /// Send an action verb (`"open"` / `"close"`) to the actions
    /// endpoint.
    ActionToken,
}

/// A fully-shaped command ready for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayCommand {
    StateName(&'static str),
    Action(&'static str),
}

impl GatewayCommand {
    /// Translate a target into the deployment's command shape. Pure.
    pub fn for_target(target: TargetState, style: CommandStyle) -> Self {
        match style {
            CommandStyle::StateName => Self::StateName(target.terminal_state().as_token()),
            CommandStyle::ActionToken => Self::Action(match target {
                TargetState::Open => "open",
                TargetState::Closed => "close",
            }),
        }
    }
}
