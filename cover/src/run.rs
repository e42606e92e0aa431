//! Timed runs
//!
//! A run energizes one relay, waits out a duration that can be cut short by
//! a [`CancelSignal`], and then de-energizes the relay. The de-energize is
//! attempted exactly once whichever way the wait ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tilted_cover_actuator::{ActuatorClient, ActuatorError, RelayGuard};
use tokio::sync::Notify;

use crate::{CoverError, CoverResult, MovementKind};

/// Cancellation flag shared between a run and whoever may preempt it
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Calling this more than once has no further effect.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        loop {
            // register before checking the flag so a cancel in between is not lost
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.as_mut().await;
            notified.set(self.inner.notify.notified());
        }
    }
}

/// How a cancellable wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

/// Sleep for `duration` unless `signal` fires first
pub async fn cancellable_sleep(duration: Duration, signal: &CancelSignal) -> WaitOutcome {
    tokio::select! {
        biased;
        _ = signal.cancelled() => WaitOutcome::Cancelled,
        _ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The full duration elapsed
    Completed,
    /// Preempted by a newer request or by stop
    Cancelled,
    /// The relay could not be energized; the wait never started
    Failed(ActuatorError),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    /// Convert to a result; a preempted run is [`CoverError::MovementCancelled`]
    pub fn into_result(self) -> CoverResult<()> {
        match self {
            RunOutcome::Completed => Ok(()),
            RunOutcome::Cancelled => Err(CoverError::MovementCancelled),
            RunOutcome::Failed(e) => Err(e.into()),
        }
    }
}

/// Energize, wait, de-energize.
///
/// A cancellation that arrives before the relay was energized skips the
/// wait but still sends the off command. Cleanup failures are logged and
/// swallowed so they never change the outcome.
pub(crate) async fn execute_run(
    client: ActuatorClient,
    kind: MovementKind,
    duration: Duration,
    signal: CancelSignal,
) -> RunOutcome {
    let direction = kind.direction();
    let guard = RelayGuard::new(client.clone(), direction);

    let outcome = match client.energize(direction).await {
        Err(e) => {
            tracing::error!(movement = %kind, "Failed to energize {} relay: {}", direction, e);
            RunOutcome::Failed(e)
        }
        Ok(()) => {
            tracing::debug!(movement = %kind, "Relay energized, running for {:?}", duration);
            match cancellable_sleep(duration, &signal).await {
                WaitOutcome::Elapsed => RunOutcome::Completed,
                WaitOutcome::Cancelled => {
                    tracing::debug!(movement = %kind, "Movement was cancelled");
                    RunOutcome::Cancelled
                }
            }
        }
    };

    if let Err(e) = client.de_energize(direction).await {
        tracing::warn!(
            movement = %kind,
            actuator = client.actuator_id(direction),
            "Failed to de-energize relay after run, it may still be energized: {}",
            e
        );
    }
    guard.defuse();

    outcome
}
