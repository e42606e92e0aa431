//! RAII guard for energized relays
//!
//! A run de-energizes its relay in-line once its wait ends. If the task
//! driving the run is torn down before it gets there (a panic, or the task
//! being aborted), the guard's `Drop` takes over. Since Drop is synchronous
//! but relay commands are async, the guard spawns the de-energize command
//! onto the current tokio runtime.

use crate::{ActuatorClient, Direction};

/// Ensures the relay for `direction` gets an off command
pub struct RelayGuard {
    client: Option<ActuatorClient>,
    direction: Direction,
}

impl RelayGuard {
    /// Arm a guard for the relay driving `direction`
    pub fn new(client: ActuatorClient, direction: Direction) -> Self {
        Self {
            client: Some(client),
            direction,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Defuse the guard once the off command has been attempted in-line.
    pub fn defuse(mut self) {
        self.client = None;
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        let direction = self.direction;
        tracing::warn!(
            actuator = client.actuator_id(direction),
            "Run ended before its cleanup ran - de-energizing relay"
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.de_energize(direction).await {
                        tracing::warn!("Deferred de-energize failed: {}", e);
                    }
                });
            }
            Err(_) => {
                tracing::warn!(
                    actuator = client.actuator_id(direction),
                    "No runtime available - relay may remain energized"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemorySwitch;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_drop_de_energizes() {
        let switch = Arc::new(InMemorySwitch::new());
        let client = ActuatorClient::new(switch.clone(), "switch.up", "switch.down");
        client.energize(Direction::Up).await.unwrap();

        let guard = RelayGuard::new(client, Direction::Up);
        drop(guard);

        // let the spawned cleanup run
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!switch.is_on("switch.up"));
        assert_eq!(switch.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_defuse_prevents_cleanup() {
        let switch = Arc::new(InMemorySwitch::new());
        let client = ActuatorClient::new(switch.clone(), "switch.up", "switch.down");

        let guard = RelayGuard::new(client, Direction::Down);
        assert_eq!(guard.direction(), Direction::Down);
        guard.defuse();

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(switch.commands().is_empty());
    }

    #[tokio::test]
    async fn test_aborted_task_still_de_energizes() {
        let switch = Arc::new(InMemorySwitch::new());
        let client = ActuatorClient::new(switch.clone(), "switch.up", "switch.down");

        let task = tokio::spawn(async move {
            client.energize(Direction::Up).await.unwrap();
            let _guard = RelayGuard::new(client, Direction::Up);
            std::future::pending::<()>().await;
        });

        while !switch.is_on("switch.up") {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!switch.is_on("switch.up"));
    }
}
