//! Relay actuator client for timed covers
//!
//! A cover is driven by two on/off relays, one per travel direction. This
//! crate defines the capability the host provides for switching them
//! ([`SwitchActuator`]), the client a cover uses to address its two relays
//! ([`ActuatorClient`]), and a guard that makes sure an energized relay is
//! switched off even if the task driving it dies.

mod error;
mod guard;
mod memory;
mod switch;

pub use error::{ActuatorError, ActuatorResult};
pub use guard::RelayGuard;
pub use memory::{InMemorySwitch, SwitchCommand};
pub use switch::{ActuatorClient, Direction, SharedSwitch, SwitchActuator};
