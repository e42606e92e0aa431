//! Switch actuator capability and the two-relay client built on it

use crate::{ActuatorError, ActuatorResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Host-provided on/off device abstraction.
///
/// Implementations return once the host has acknowledged that the command
/// was applied. Actuators are addressed by an opaque identifier.
#[async_trait]
pub trait SwitchActuator: Send + Sync {
    /// Turn the actuator on or off and wait for the acknowledgement
    async fn set_actuator(&self, id: &str, on: bool) -> ActuatorResult<()>;
}

/// Shared handle to a switch host
pub type SharedSwitch = Arc<dyn SwitchActuator>;

/// Which of the two relays a command targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Issues relay commands for one cover.
///
/// Holds nothing but the two relay identifiers and the switch host.
#[derive(Clone)]
pub struct ActuatorClient {
    switch: SharedSwitch,
    up_id: String,
    down_id: String,
    command_timeout: Option<Duration>,
}

impl ActuatorClient {
    /// Create a client for the given up/down relays
    pub fn new(switch: SharedSwitch, up_id: impl Into<String>, down_id: impl Into<String>) -> Self {
        Self {
            switch,
            up_id: up_id.into(),
            down_id: down_id.into(),
            command_timeout: None,
        }
    }

    /// Fail commands that are not acknowledged within `timeout`.
    ///
    /// Without this a command waits for as long as the host takes.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Identifier of the relay driving `direction`
    pub fn actuator_id(&self, direction: Direction) -> &str {
        match direction {
            Direction::Up => &self.up_id,
            Direction::Down => &self.down_id,
        }
    }

    /// Send an on/off command to a relay and wait for it to be applied
    pub async fn set_actuator(&self, id: &str, on: bool) -> ActuatorResult<()> {
        tracing::debug!(actuator = id, on, "Sending actuator command");

        let command = self.switch.set_actuator(id, on);
        match self.command_timeout {
            Some(limit) => match tokio::time::timeout(limit, command).await {
                Ok(result) => result,
                Err(_) => Err(ActuatorError::timeout(id, on, limit.as_millis() as u64)),
            },
            None => command.await,
        }
    }

    /// Energize the relay for `direction`
    pub async fn energize(&self, direction: Direction) -> ActuatorResult<()> {
        self.set_actuator(self.actuator_id(direction), true).await
    }

    /// De-energize the relay for `direction`
    pub async fn de_energize(&self, direction: Direction) -> ActuatorResult<()> {
        self.set_actuator(self.actuator_id(direction), false).await
    }

    /// De-energize both relays.
    ///
    /// Both commands are always sent; the first failure is returned.
    pub async fn all_off(&self) -> ActuatorResult<()> {
        let up = self.de_energize(Direction::Up).await;
        let down = self.de_energize(Direction::Down).await;
        up.and(down)
    }
}

impl std::fmt::Debug for ActuatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorClient")
            .field("up_id", &self.up_id)
            .field("down_id", &self.down_id)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemorySwitch;

    fn client(switch: &Arc<InMemorySwitch>) -> ActuatorClient {
        ActuatorClient::new(switch.clone(), "switch.up", "switch.down")
    }

    #[test]
    fn test_actuator_ids_by_direction() {
        let switch = Arc::new(InMemorySwitch::new());
        let client = client(&switch);
        assert_eq!(client.actuator_id(Direction::Up), "switch.up");
        assert_eq!(client.actuator_id(Direction::Down), "switch.down");
        assert_eq!(Direction::Up.to_string(), "up");
    }

    #[tokio::test]
    async fn test_energize_and_de_energize() {
        let switch = Arc::new(InMemorySwitch::new());
        let client = client(&switch);

        client.energize(Direction::Down).await.unwrap();
        assert!(switch.is_on("switch.down"));
        assert!(!switch.is_on("switch.up"));

        client.de_energize(Direction::Down).await.unwrap();
        assert!(!switch.is_on("switch.down"));
        assert_eq!(switch.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_all_off_sends_both_commands_even_after_failure() {
        let switch = Arc::new(InMemorySwitch::new());
        switch.fail_command("switch.up", false);
        let client = client(&switch);

        let result = client.all_off().await;
        assert!(matches!(result, Err(ActuatorError::CommandFailed { ref actuator, .. }) if actuator == "switch.up"));

        let commands = switch.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[1].actuator, "switch.down");
        assert!(!commands[1].on);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_timeout() {
        let switch = Arc::new(InMemorySwitch::new().with_latency(Duration::from_secs(5)));
        let client = client(&switch).with_command_timeout(Duration::from_secs(1));

        let result = client.energize(Direction::Up).await;
        assert_eq!(result, Err(ActuatorError::timeout("switch.up", true, 1000)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_timeout_by_default() {
        let switch = Arc::new(InMemorySwitch::new().with_latency(Duration::from_secs(5)));
        let client = client(&switch);

        client.energize(Direction::Up).await.unwrap();
        assert!(switch.is_on("switch.up"));
    }
}
