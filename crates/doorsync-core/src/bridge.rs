// ── Bridge lifecycle ──
//
// Owns the reconciliation loop, the command intake channel, and the
// confirmation tasks spawned per accepted command. Everything
// communicates through the shared SnapshotStore; ordering between the
// loop's writes and a confirmation task's writes is deliberately
// unspecified (both derive their values from the same remote source, so
// last-writer-wins converges).

use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::CoreError;
use crate::gateway::StateGateway;
use crate::model::{DoorState, GatewayCommand, TargetState};
use crate::snapshot::{PendingCommand, SnapshotStore};

/// Bridges one remote door to the locally-exposed snapshot.
///
/// Cheaply cloneable via `Arc`. [`start()`](Self::start) performs the
/// initial fetch and spawns the background tasks;
/// [`shutdown()`](Self::shutdown) stops them promptly.
pub struct Bridge<G: StateGateway> {
    inner: Arc<Inner<G>>,
}

impl<G: StateGateway> Clone for Bridge<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<G> {
    config: BridgeConfig,
    gateway: G,
    snapshot: SnapshotStore,
    // Std mutex: held only for a pointer-sized swap, never across await.
    pending: Mutex<Option<PendingCommand>>,
    cancel: CancellationToken,
    command_tx: mpsc::Sender<TargetState>,
    command_rx: AsyncMutex<Option<mpsc::Receiver<TargetState>>>,
    task_handles: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl<G: StateGateway> Bridge<G> {
    /// Create a bridge. Does no I/O — call [`start()`](Self::start).
    ///
    /// The snapshot holds a `closed` placeholder until `start()` seeds
    /// it from the first remote fetch.
    pub fn new(config: BridgeConfig, gateway: G) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_queue_depth.max(1));

        Self {
            inner: Arc::new(Inner {
                config,
                gateway,
                snapshot: SnapshotStore::new(DoorState::Closed),
                pending: Mutex::new(None),
                cancel: CancellationToken::new(),
                command_tx,
                command_rx: AsyncMutex::new(Some(command_rx)),
                task_handles: AsyncMutex::new(Vec::new()),
            }),
        }
    }

    /// Access the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Fetch the initial door state, then spawn the reconciliation loop
    /// and the command dispatcher.
    ///
    /// The initial fetch happens here, before either timer exists, so
    /// the snapshot is populated before any consumer reads it. Failure
    /// at this point is fatal: the bridge's precondition is a working,
    /// authenticated gateway.
    pub async fn start(&self) -> Result<(), CoreError> {
        let rx = self
            .inner
            .command_rx
            .lock()
            .await
            .take()
            .ok_or(CoreError::AlreadyStarted)?;

        let token = self
            .inner
            .gateway
            .fetch_state(&self.inner.config.device_id)
            .await?;
        let state = DoorState::from_token(&token)?;

        self.inner.snapshot.set_current(state);
        if let Some(target) = state.implied_target() {
            self.inner.snapshot.set_target(target);
        }
        info!(state = %state, "initial door state");

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(tokio::spawn(reconcile_task(self.clone())));
        handles.push(tokio::spawn(dispatch_task(self.clone(), rx)));
        Ok(())
    }

    /// Stop the background tasks and wait for them to exit.
    ///
    /// Confirmation tasks are not cancelled — they self-terminate at
    /// their deadline and only touch local state.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("bridge stopped");
    }

    // ── Presentation-layer surface ───────────────────────────────────

    /// Request a target-state change. Never blocks the caller: the
    /// request is queued for the dispatcher, and dropped with a warning
    /// if the queue is full (the human will press the switch again).
    pub fn request_target_state(&self, target: TargetState) {
        use mpsc::error::TrySendError;

        match self.inner.command_tx.try_send(target) {
            Ok(()) => {}
            Err(TrySendError::Full(t)) => {
                warn!(target = %t, "command queue full, dropping request");
            }
            Err(TrySendError::Closed(t)) => {
                warn!(target = %t, "bridge is shut down, dropping request");
            }
        }
    }

    /// Current observed door state.
    pub fn current_state(&self) -> DoorState {
        self.inner.snapshot.current()
    }

    /// Current commanded target.
    pub fn target_state(&self) -> TargetState {
        self.inner.snapshot.target()
    }

    /// Subscribe to current-state changes.
    pub fn watch_current(&self) -> tokio::sync::watch::Receiver<DoorState> {
        self.inner.snapshot.watch_current()
    }

    /// Subscribe to target-state changes.
    pub fn watch_target(&self) -> tokio::sync::watch::Receiver<TargetState> {
        self.inner.snapshot.watch_target()
    }

    /// The command currently awaiting confirmation, if any.
    pub fn pending_command(&self) -> Option<PendingCommand> {
        self.inner.pending.lock().ok().and_then(|slot| *slot)
    }

    // ── Tick logic ───────────────────────────────────────────────────

    /// One reconciliation tick: fetch, map, apply.
    ///
    /// Returns the state the cadence decision should be based on, or
    /// `None` when the fetch failed and the previous decision stands.
    async fn refresh_once(&self) -> Option<DoorState> {
        match self
            .inner
            .gateway
            .fetch_state(&self.inner.config.device_id)
            .await
        {
            Ok(token) => match DoorState::from_token(&token) {
                Ok(state) => {
                    self.apply_observation(state);
                    Some(state)
                }
                Err(e) => {
                    // Soft: keep the previous value, decide cadence
                    // from the last known state.
                    warn!(token = %e.token, "ignoring unrecognized door state token");
                    Some(self.inner.snapshot.current())
                }
            },
            Err(e) => {
                warn!(error = %e, "error fetching current state");
                None
            }
        }
    }

    /// Write an observed state into the snapshot, inferring the target
    /// when the deployment supports it.
    fn apply_observation(&self, state: DoorState) {
        let previous = self.inner.snapshot.current();
        self.inner.snapshot.set_current(state);

        if previous == state {
            debug!(state = %state, "door state unchanged");
        } else {
            info!(from = %previous, to = %state, "door state changed");
        }

        if self.inner.config.target_inference {
            if let Some(target) = state.implied_target() {
                self.inner.snapshot.set_target(target);
            }
        }
    }

    // ── Command handling ─────────────────────────────────────────────

    /// Translate and issue one command, then begin confirmation.
    async fn dispatch_command(&self, target: TargetState) {
        let config = &self.inner.config;

        // The request itself is the presentation layer's target write;
        // it stands even if the gateway call fails, until the next
        // successful fetch corrects it.
        self.inner.snapshot.set_target(target);

        let command = GatewayCommand::for_target(target, config.command_style);
        info!(target = %target, "setting door to {target}");

        if let Err(e) = self
            .inner
            .gateway
            .send_command(&config.device_id, command)
            .await
        {
            warn!(error = %e, "unable to set door state");
            return;
        }

        let pending = PendingCommand {
            desired: target.terminal_state(),
            issued_at: Instant::now(),
        };
        if let Ok(mut slot) = self.inner.pending.lock() {
            // A newer command supersedes any prior one; the old
            // confirmation task keeps running but its result is moot.
            *slot = Some(pending);
        }

        let bridge = self.clone();
        tokio::spawn(async move { bridge.confirm_command(pending).await });
    }

    /// Bounded confirmation sequence: poll fast until the desired state
    /// is observed or the deadline passes.
    ///
    /// The first check is delayed by one interval on purpose — the
    /// service often reports the old state immediately after accepting
    /// a command.
    async fn confirm_command(&self, pending: PendingCommand) {
        let config = &self.inner.config;
        let deadline = Instant::now() + config.confirm_timeout;

        loop {
            time::sleep(config.confirm_interval).await;
            if Instant::now() >= deadline {
                // Not a failure: the door may still be moving, and the
                // regular loop's fast-poll path keeps tracking it.
                info!(desired = %pending.desired, "door did not reach target state before deadline");
                break;
            }

            match self
                .inner
                .gateway
                .fetch_state(&self.inner.config.device_id)
                .await
            {
                Ok(token) => match DoorState::from_token(&token) {
                    Ok(state) => {
                        self.apply_observation(state);
                        if state == pending.desired {
                            if let Some(target) = state.implied_target() {
                                self.inner.snapshot.set_target(target);
                            }
                            info!(
                                desired = %pending.desired,
                                elapsed = ?pending.issued_at.elapsed(),
                                "door reached target state"
                            );
                            self.clear_pending(pending);
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(token = %e.token, "ignoring unrecognized door state token");
                    }
                },
                Err(e) => {
                    warn!(error = %e, "error fetching state during confirmation");
                }
            }
        }

        self.clear_pending(pending);
    }

    /// Clear the pending slot, but only if it still holds our own
    /// entry — a superseding command must not be wiped by a stale task.
    fn clear_pending(&self, own: PendingCommand) {
        if let Ok(mut slot) = self.inner.pending.lock() {
            if *slot == Some(own) {
                *slot = None;
            }
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// The reconciliation loop: a multi-way wait over the regular interval,
/// the fast-poll timer (when armed), and cancellation.
///
/// The fast-poll timer is re-armed after every tick based on whether
/// the door is mid-transition, so a moving door is tracked on a
/// seconds scale while an idle one costs one fetch per regular
/// interval.
async fn reconcile_task<G: StateGateway>(bridge: Bridge<G>) {
    let config = &bridge.inner.config;
    let cancel = bridge.inner.cancel.clone();

    let mut interval = time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The immediate first tick; start() already did the initial fetch.
    interval.tick().await;

    let mut fast_armed = bridge.inner.snapshot.current().is_transitional();

    info!("entering door state update loop");
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
            () = time::sleep(config.fast_poll_interval), if fast_armed => {}
        }

        // Fetch failure keeps the previous cadence decision.
        if let Some(state) = bridge.refresh_once().await {
            fast_armed = state.is_transitional();
        }
    }
    info!("exiting door state update loop");
}

/// Consume command requests from the intake channel.
async fn dispatch_task<G: StateGateway>(bridge: Bridge<G>, mut rx: mpsc::Receiver<TargetState>) {
    let cancel = bridge.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            request = rx.recv() => {
                let Some(target) = request else { break };
                bridge.dispatch_command(target).await;
            }
        }
    }
}
