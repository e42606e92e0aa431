//! In-memory switch host
//!
//! Stands in for the host's switch service when no real relays are attached.
//! Every command attempt is recorded with the (tokio) times it was issued
//! and acknowledged, and failures can be injected per actuator and direction.

use crate::{ActuatorError, ActuatorResult, SwitchActuator};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// One recorded command attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchCommand {
    pub actuator: String,
    pub on: bool,
    /// When the caller sent the command
    pub issued_at: Instant,
    /// When the host acknowledged it
    pub at: Instant,
    /// False when the command was rejected by an injected failure
    pub applied: bool,
}

#[derive(Debug, Default)]
struct SwitchBook {
    energized: HashSet<String>,
    commands: Vec<SwitchCommand>,
    failures: HashMap<(String, bool), String>,
    max_energized: usize,
}

/// Switch host that keeps relay states in memory
#[derive(Debug, Default)]
pub struct InMemorySwitch {
    book: Mutex<SwitchBook>,
    latency: Duration,
}

impl InMemorySwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every acknowledgement by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn book(&self) -> MutexGuard<'_, SwitchBook> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reject every future `on`/`off` command to `actuator`
    pub fn fail_command(&self, actuator: &str, on: bool) {
        self.book()
            .failures
            .insert((actuator.to_string(), on), "injected failure".to_string());
    }

    /// Stop rejecting commands to `actuator`
    pub fn clear_failures(&self, actuator: &str) {
        self.book().failures.retain(|(id, _), _| id != actuator);
    }

    pub fn is_on(&self, actuator: &str) -> bool {
        self.book().energized.contains(actuator)
    }

    /// Actuators currently energized
    pub fn energized(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.book().energized.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Highest number of actuators that were ever energized at once
    pub fn max_energized(&self) -> usize {
        self.book().max_energized
    }

    /// All command attempts in the order they were acknowledged
    pub fn commands(&self) -> Vec<SwitchCommand> {
        self.book().commands.clone()
    }

    /// Command attempts as `(actuator, on)` pairs
    pub fn command_pairs(&self) -> Vec<(String, bool)> {
        self.book()
            .commands
            .iter()
            .map(|c| (c.actuator.clone(), c.on))
            .collect()
    }

    pub fn clear_commands(&self) {
        self.book().commands.clear();
    }
}

#[async_trait]
impl SwitchActuator for InMemorySwitch {
    async fn set_actuator(&self, id: &str, on: bool) -> ActuatorResult<()> {
        let issued_at = Instant::now();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut book = self.book();
        let failure = book.failures.get(&(id.to_string(), on)).cloned();
        book.commands.push(SwitchCommand {
            actuator: id.to_string(),
            on,
            issued_at,
            at: Instant::now(),
            applied: failure.is_none(),
        });

        if let Some(message) = failure {
            return Err(ActuatorError::command_failed(id, on, message));
        }

        if on {
            book.energized.insert(id.to_string());
            book.max_energized = book.max_energized.max(book.energized.len());
        } else {
            book.energized.remove(id);
        }
        Ok(())
    }
}
