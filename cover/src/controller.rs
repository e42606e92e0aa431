//! Timed movement controller
//!
//! Drives one cover through its two relays. Every operation retires the
//! run in flight (cancel, then wait for its cleanup to finish) before it
//! starts its own, so at most one relay is ever energized by a controller
//! and the previous relay's off command is acknowledged before the next
//! relay's on command goes out.
//!
//! Position and tilt are inferred: a run that completes moves the cover to
//! the fully open/closed end, a run that is interrupted leaves the last
//! known values untouched. No partial position is derived from elapsed time,
//! so after an interrupted travel the reported position is stale.
//! State is never persisted; a new controller starts closed with tilt 0.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use tilted_cover_actuator::{ActuatorClient, SharedSwitch};
use tokio::sync::{watch, Mutex};

use crate::run::{execute_run, CancelSignal, RunOutcome};
use crate::{CoverConfig, CoverError, CoverResult, CoverState, MovementKind, MovementPhase, StatePublisher};

/// The run currently occupying a controller
struct MovementHandle {
    id: u64,
    kind: MovementKind,
    signal: CancelSignal,
    finished: watch::Receiver<Option<RunOutcome>>,
}

async fn wait_for_outcome(finished: &mut watch::Receiver<Option<RunOutcome>>) -> RunOutcome {
    match finished.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone().unwrap_or(RunOutcome::Cancelled),
        Err(_) => {
            // sender dropped without a result: the run task died
            tracing::warn!("Run task ended without reporting an outcome");
            RunOutcome::Cancelled
        }
    }
}

/// Single-flight controller for one cover
pub struct TimedMovementController {
    config: CoverConfig,
    client: ActuatorClient,
    state: Arc<StdMutex<CoverState>>,
    publisher: Arc<dyn StatePublisher>,
    active: Mutex<Option<MovementHandle>>,
    next_id: AtomicU64,
}

impl TimedMovementController {
    /// Create a controller addressing the relays named in `config`
    pub fn new(config: CoverConfig, switch: SharedSwitch, publisher: Arc<dyn StatePublisher>) -> Self {
        let client = ActuatorClient::new(switch, &config.up_actuator_id, &config.down_actuator_id);
        Self::with_client(config, client, publisher)
    }

    /// Create a controller around a preconfigured client
    pub fn with_client(config: CoverConfig, client: ActuatorClient, publisher: Arc<dyn StatePublisher>) -> Self {
        Self {
            config,
            client,
            state: Arc::new(StdMutex::new(CoverState::default())),
            publisher,
            active: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &CoverConfig {
        &self.config
    }

    pub fn client(&self) -> &ActuatorClient {
        &self.client
    }

    /// Snapshot of the current state
    pub fn state(&self) -> CoverState {
        lock_state(&self.state).clone()
    }

    pub fn phase(&self) -> MovementPhase {
        lock_state(&self.state).phase()
    }

    pub fn is_moving(&self) -> bool {
        lock_state(&self.state).movement.is_some()
    }

    // =========================================================================
    // Movement commands
    // =========================================================================

    /// Run the up relay for the full travel time
    pub async fn open(&self) -> CoverResult<()> {
        self.run(MovementKind::Open).await
    }

    /// Run the down relay for the full travel time
    pub async fn close(&self) -> CoverResult<()> {
        self.run(MovementKind::Close).await
    }

    /// Run the up relay for the tilt time
    pub async fn open_tilt(&self) -> CoverResult<()> {
        self.run(MovementKind::OpenTilt).await
    }

    /// Run the down relay for the tilt time
    pub async fn close_tilt(&self) -> CoverResult<()> {
        self.run(MovementKind::CloseTilt).await
    }

    /// Stop any run and switch both relays off.
    ///
    /// Position and tilt keep their last known values. Both off commands are
    /// sent even when idle; the first failure is returned.
    pub async fn stop(&self) -> CoverResult<()> {
        let mut active = self.active.lock().await;
        self.retire_active(&mut active).await;

        let result = self.client.all_off().await;
        self.update(|state| {
            state.is_opening = false;
            state.is_closing = false;
        });

        if let Err(e) = &result {
            tracing::warn!(cover = %self.config.name, "Stop could not switch off both relays: {}", e);
        }
        result.map_err(Into::into)
    }

    // =========================================================================
    // Run management
    // =========================================================================

    fn duration_for(&self, kind: MovementKind) -> Duration {
        match kind {
            MovementKind::Open => self.config.travel_up(),
            MovementKind::Close => self.config.travel_down(),
            MovementKind::OpenTilt => self.config.tilt_open(),
            MovementKind::CloseTilt => self.config.tilt_close(),
        }
    }

    /// Start a run of `kind` and wait for it to end.
    ///
    /// Returns `Ok` when the run completed or was preempted, and the
    /// actuator error when the relay could not be energized.
    async fn run(&self, kind: MovementKind) -> CoverResult<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let duration = self.duration_for(kind);

        let mut finished = {
            let mut active = self.active.lock().await;
            self.retire_active(&mut active).await;

            tracing::info!(cover = %self.config.name, movement = %kind, "Starting movement for {:?}", duration);
            self.update(|state| state.begin(id, kind));

            let signal = CancelSignal::new();
            let (tx, rx) = watch::channel(None);
            let client = self.client.clone();
            let state = self.state.clone();
            let publisher = self.publisher.clone();
            let run_signal = signal.clone();

            tokio::spawn(async move {
                let outcome = execute_run(client, kind, duration, run_signal).await;
                {
                    let mut state = lock_state(&state);
                    if state.finish(id, kind, outcome.is_completed()) {
                        publisher.publish(&state);
                    }
                }
                let _ = tx.send(Some(outcome));
            });

            *active = Some(MovementHandle {
                id,
                kind,
                signal,
                finished: rx.clone(),
            });
            rx
        };

        let outcome = wait_for_outcome(&mut finished).await;

        {
            let mut active = self.active.lock().await;
            if active.as_ref().map(|handle| handle.id) == Some(id) {
                active.take();
            }
        }

        match outcome.into_result() {
            Ok(()) => {
                tracing::info!(cover = %self.config.name, movement = %kind, "Movement completed");
                Ok(())
            }
            Err(CoverError::MovementCancelled) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Cancel the run in the slot, if any, and wait for its cleanup.
    ///
    /// The handle stays in the slot until the run has finished, so a caller
    /// that is dropped while waiting here leaves it for the next one.
    async fn retire_active(&self, active: &mut Option<MovementHandle>) {
        let Some(handle) = active.as_ref() else {
            return;
        };
        let (id, kind) = (handle.id, handle.kind);
        let mut finished = handle.finished.clone();

        tracing::debug!(cover = %self.config.name, movement = %kind, "Cancelling movement in flight");
        handle.signal.cancel();
        wait_for_outcome(&mut finished).await;

        // a run task that died never cleared its own flags
        let stale = lock_state(&self.state).run_id == Some(id);
        if stale {
            self.update(|state| {
                state.finish(id, kind, false);
            });
        }
        *active = None;
    }

    fn update(&self, apply: impl FnOnce(&mut CoverState)) {
        let mut state = lock_state(&self.state);
        apply(&mut state);
        self.publisher.publish(&state);
    }
}

impl Drop for TimedMovementController {
    fn drop(&mut self) {
        // the run task keeps going on its own; cancel it so its relay goes off
        if let Ok(mut active) = self.active.try_lock() {
            if let Some(handle) = active.take() {
                handle.signal.cancel();
            }
        }
    }
}

impl std::fmt::Debug for TimedMovementController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedMovementController")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

fn lock_state(state: &StdMutex<CoverState>) -> MutexGuard<'_, CoverState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
