// Bridge behavior tests with a scripted gateway and paused time.
//
// `start_paused = true` makes every sleep/interval deterministic: the
// runtime auto-advances the clock when all tasks are idle, so these
// tests cover minutes of polling behavior in milliseconds of wall time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;

use doorsync_core::{
    Bridge, BridgeConfig, CommandStyle, DoorState, GatewayCommand, GatewayError, StateGateway,
    TargetState,
};

// ── Scripted gateway ────────────────────────────────────────────────

/// In-memory gateway: fetches pop from a script queue, falling back to
/// a settable steady state once the script runs dry.
#[derive(Default)]
struct FakeGateway {
    script: Mutex<VecDeque<Result<String, GatewayError>>>,
    steady: Mutex<String>,
    commands: Mutex<Vec<GatewayCommand>>,
    fail_next_command: Mutex<bool>,
    fetches: AtomicUsize,
}

impl FakeGateway {
    fn with_state(token: &str) -> Arc<Self> {
        let gw = Self::default();
        *gw.steady.lock().expect("lock") = token.to_owned();
        Arc::new(gw)
    }

    fn set_state(&self, token: &str) {
        *self.steady.lock().expect("lock") = token.to_owned();
    }

    fn push_response(&self, response: Result<&str, GatewayError>) {
        self.script
            .lock()
            .expect("lock")
            .push_back(response.map(str::to_owned));
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn sent_commands(&self) -> Vec<GatewayCommand> {
        self.commands.lock().expect("lock").clone()
    }
}

impl StateGateway for FakeGateway {
    async fn fetch_state(&self, _device_id: &str) -> Result<String, GatewayError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(scripted) = self.script.lock().expect("lock").pop_front() {
            return scripted;
        }
        Ok(self.steady.lock().expect("lock").clone())
    }

    async fn send_command(
        &self,
        _device_id: &str,
        command: GatewayCommand,
    ) -> Result<(), GatewayError> {
        let mut fail = self.fail_next_command.lock().expect("lock");
        if *fail {
            *fail = false;
            return Err(GatewayError::Transient("command write failed".into()));
        }
        self.commands.lock().expect("lock").push(command);
        Ok(())
    }
}

fn test_config() -> BridgeConfig {
    BridgeConfig {
        device_id: "GD-0001".into(),
        poll_interval: Duration::from_secs(300),
        fast_poll_interval: Duration::from_secs(5),
        confirm_interval: Duration::from_secs(5),
        confirm_timeout: Duration::from_secs(60),
        ..BridgeConfig::default()
    }
}

async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

// ── Startup ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn initial_fetch_populates_snapshot_before_timers() {
    let gw = FakeGateway::with_state("closed");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));

    bridge.start().await.expect("start");

    assert_eq!(bridge.current_state(), DoorState::Closed);
    assert_eq!(bridge.target_state(), TargetState::Closed);
    assert_eq!(gw.fetch_count(), 1);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn second_start_is_rejected() {
    let gw = FakeGateway::with_state("closed");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));

    bridge.start().await.expect("start");
    assert!(bridge.start().await.is_err());

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn startup_fails_on_unknown_initial_token() {
    let gw = FakeGateway::with_state("ajar");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));

    assert!(bridge.start().await.is_err());
}

// ── Adaptive polling ────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn transitional_state_arms_fast_poll() {
    let gw = FakeGateway::with_state("opening");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    assert_eq!(bridge.current_state(), DoorState::Opening);

    // The fast-poll timer should fire on a 5-second scale, long before
    // the 300-second regular interval.
    gw.set_state("open");
    advance(6).await;

    assert_eq!(bridge.current_state(), DoorState::Open);
    assert_eq!(bridge.target_state(), TargetState::Open);
    assert_eq!(gw.fetch_count(), 2);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn terminal_state_disarms_fast_poll() {
    let gw = FakeGateway::with_state("closing");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    gw.set_state("closed");
    advance(6).await;
    assert_eq!(bridge.current_state(), DoorState::Closed);
    let fetches_after_settle = gw.fetch_count();

    // Once terminal, only the regular interval polls.
    advance(120).await;
    assert_eq!(gw.fetch_count(), fetches_after_settle);

    advance(300).await;
    assert!(gw.fetch_count() > fetches_after_settle);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn fetch_error_keeps_previous_cadence_and_recovers() {
    let gw = FakeGateway::with_state("closing");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    // Next fast-poll tick fails; the snapshot must hold and the fast
    // timer must stay armed.
    gw.push_response(Err(GatewayError::Transient("boom".into())));
    advance(6).await;
    assert_eq!(bridge.current_state(), DoorState::Closing);

    // The tick after that succeeds and normal operation resumes.
    gw.set_state("closed");
    advance(5).await;
    assert_eq!(bridge.current_state(), DoorState::Closed);
    assert_eq!(bridge.target_state(), TargetState::Closed);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_token_mid_run_retains_previous_state() {
    let gw = FakeGateway::with_state("opening");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    gw.push_response(Ok("ajar"));
    advance(6).await;

    // Noise is a no-op, not a reset.
    assert_eq!(bridge.current_state(), DoorState::Opening);

    bridge.shutdown().await;
}

// ── Command dispatch and confirmation ───────────────────────────────

#[tokio::test(start_paused = true)]
async fn command_confirms_within_one_poll_of_the_door_arriving() {
    let gw = FakeGateway::with_state("closed");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    bridge.request_target_state(TargetState::Open);
    advance(1).await;

    assert_eq!(bridge.target_state(), TargetState::Open);
    assert_eq!(bridge.current_state(), DoorState::Closed);
    assert_eq!(gw.sent_commands(), vec![GatewayCommand::StateName("open")]);
    assert!(bridge.pending_command().is_some());

    // Door is there by the first confirmation check (t=5s).
    gw.set_state("open");
    advance(6).await;

    assert_eq!(bridge.current_state(), DoorState::Open);
    assert_eq!(bridge.target_state(), TargetState::Open);
    assert!(bridge.pending_command().is_none());

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn closed_to_open_tracks_transitional_states() {
    let gw = FakeGateway::with_state("closed");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    let mut seen = bridge.watch_current();

    bridge.request_target_state(TargetState::Open);

    // Confirmation polls at 5s, 10s, 15s; the door reports closing
    // twice before arriving.
    gw.push_response(Ok("closing"));
    gw.push_response(Ok("closing"));
    gw.set_state("open");

    advance(16).await;

    assert_eq!(bridge.current_state(), DoorState::Open);
    assert_eq!(bridge.target_state(), TargetState::Open);
    assert!(bridge.pending_command().is_none());

    // The subscriber was notified and sees the settled state.
    assert!(seen.has_changed().expect("sender alive"));
    assert_eq!(*seen.borrow_and_update(), DoorState::Open);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn confirmation_times_out_without_touching_target() {
    let gw = FakeGateway::with_state("closed");
    let config = BridgeConfig {
        // Deployment variant: service reports no transitional states
        // and target is driven by commands alone.
        target_inference: false,
        ..test_config()
    };
    let bridge = Bridge::new(config, Arc::clone(&gw));
    bridge.start().await.expect("start");

    bridge.request_target_state(TargetState::Open);
    advance(1).await;
    assert!(bridge.pending_command().is_some());

    // The door never arrives. The sequence must exit at the deadline,
    // leaving the requested target in place and no task behind.
    advance(70).await;

    assert!(bridge.pending_command().is_none());
    assert_eq!(bridge.current_state(), DoorState::Closed);
    assert_eq!(bridge.target_state(), TargetState::Open);

    // Checks happened every 5s inside the 60s window, no more.
    let confirm_fetches = gw.fetch_count() - 1;
    assert!(
        (10..=12).contains(&confirm_fetches),
        "unexpected confirmation poll count: {confirm_fetches}"
    );

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failed_command_write_starts_no_confirmation() {
    let gw = FakeGateway::with_state("closed");
    let config = BridgeConfig {
        target_inference: false,
        ..test_config()
    };
    let bridge = Bridge::new(config, Arc::clone(&gw));
    bridge.start().await.expect("start");

    *gw.fail_next_command.lock().expect("lock") = true;
    bridge.request_target_state(TargetState::Open);
    advance(1).await;

    assert!(bridge.pending_command().is_none());
    assert!(gw.sent_commands().is_empty());
    // Optimistic: the requested target stands until a fetch corrects it.
    assert_eq!(bridge.target_state(), TargetState::Open);

    // No confirmation polling follows.
    let fetches = gw.fetch_count();
    advance(30).await;
    assert_eq!(gw.fetch_count(), fetches);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn action_token_deployment_sends_verbs() {
    let gw = FakeGateway::with_state("open");
    let config = BridgeConfig {
        command_style: CommandStyle::ActionToken,
        target_inference: false,
        ..test_config()
    };
    let bridge = Bridge::new(config, Arc::clone(&gw));
    bridge.start().await.expect("start");

    bridge.request_target_state(TargetState::Closed);
    advance(1).await;

    assert_eq!(gw.sent_commands(), vec![GatewayCommand::Action("close")]);

    gw.set_state("closed");
    advance(6).await;
    assert_eq!(bridge.current_state(), DoorState::Closed);
    assert_eq!(bridge.target_state(), TargetState::Closed);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn newer_command_supersedes_pending() {
    let gw = FakeGateway::with_state("closed");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    bridge.request_target_state(TargetState::Open);
    advance(1).await;
    let first = bridge.pending_command().expect("pending");

    bridge.request_target_state(TargetState::Closed);
    advance(1).await;
    let second = bridge.pending_command().expect("pending");

    assert_ne!(first, second);
    assert_eq!(second.desired, DoorState::Closed);
    assert_eq!(bridge.target_state(), TargetState::Closed);

    // The second sequence confirms against the still-closed door and
    // clears the slot. The first keeps polling for an open that never
    // comes; when it times out it must not wipe anything (its own
    // entry is long gone).
    advance(6).await;
    assert!(bridge.pending_command().is_none());
    assert_eq!(bridge.current_state(), DoorState::Closed);

    bridge.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn full_queue_drops_requests_instead_of_blocking() {
    let gw = FakeGateway::with_state("closed");
    let config = BridgeConfig {
        command_queue_depth: 1,
        ..test_config()
    };
    // Not started: nothing drains the queue, so the second request
    // must be dropped on the floor without blocking or panicking.
    let bridge = Bridge::new(config, Arc::clone(&gw));

    bridge.request_target_state(TargetState::Open);
    bridge.request_target_state(TargetState::Closed);
    bridge.request_target_state(TargetState::Open);
}

// ── Shutdown ────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn shutdown_is_prompt_even_mid_interval() {
    let gw = FakeGateway::with_state("closed");
    let bridge = Bridge::new(test_config(), Arc::clone(&gw));
    bridge.start().await.expect("start");

    // The loop is parked on a 300s interval; cancellation must not
    // wait for it.
    advance(10).await;
    tokio::time::timeout(Duration::from_secs(5), bridge.shutdown())
        .await
        .expect("shutdown should be prompt");

    // Requests after shutdown are dropped, not errors.
    bridge.request_target_state(TargetState::Open);
}
