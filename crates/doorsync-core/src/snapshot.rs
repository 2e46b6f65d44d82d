// ── Shared door snapshot ──
//
// The authoritative local view of the door, mutated by the
// reconciliation loop and confirmation tasks and read by the
// presentation layer. All access goes through methods; the watch
// channels are the synchronization boundary.

use tokio::sync::watch;
use tokio::time::Instant;

use crate::model::{DoorState, TargetState};

/// Reactive store for the door's current and target state.
///
/// `current` and `target` are independently settable on purpose: while a
/// command is in flight they legitimately disagree until confirmation.
/// Writes are last-writer-wins; both writers derive their values from
/// the same remote source of truth, so concurrent writes converge.
pub struct SnapshotStore {
    current: watch::Sender<DoorState>,
    target: watch::Sender<TargetState>,
    last_refresh: watch::Sender<Option<Instant>>,
}

impl SnapshotStore {
    /// Create a store seeded with an initial observed state.
    ///
    /// The initial target is inferred from the observed state (a stopped
    /// door is treated as commanded-closed, matching how the service
    /// itself reports a freshly-stopped door).
    pub fn new(initial: DoorState) -> Self {
        let (current, _) = watch::channel(initial);
        let (target, _) = watch::channel(initial.implied_target().unwrap_or(TargetState::Closed));
        let (last_refresh, _) = watch::channel(None);
        Self {
            current,
            target,
            last_refresh,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn current(&self) -> DoorState {
        *self.current.borrow()
    }

    pub fn target(&self) -> TargetState {
        *self.target.borrow()
    }

    pub fn last_refresh(&self) -> Option<Instant> {
        *self.last_refresh.borrow()
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub fn set_current(&self, state: DoorState) {
        self.current.send_replace(state);
        self.last_refresh.send_replace(Some(Instant::now()));
    }

    pub fn set_target(&self, target: TargetState) {
        self.target.send_replace(target);
    }

    // ── Subscriptions (presentation layer) ───────────────────────────

    /// Subscribe to current-state changes.
    pub fn watch_current(&self) -> watch::Receiver<DoorState> {
        self.current.subscribe()
    }

    /// Subscribe to target-state changes.
    pub fn watch_target(&self) -> watch::Receiver<TargetState> {
        self.target.subscribe()
    }
}

/// A dispatched command awaiting confirmation.
///
/// At most one is active at a time; a newer command overwrites it. A
/// confirmation task clears the slot only if its own entry is still the
/// active one, so a superseding command is never wiped by a stale task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub desired: DoorState,
    pub issued_at: Instant,
}
