//! Timed tilt cover
//!
//! Controls a shade or blind that has an "up" relay and a "down" relay and
//! no position feedback. Position and tilt are inferred from how long a
//! relay was run against the configured travel and tilt times.
//!
//! ## Components
//!
//! - [`CoverConfig`]: relay identifiers and durations, validated when the
//!   config entry is loaded
//! - [`TimedMovementController`]: single-flight run state machine with
//!   cancel-then-replace preemption
//! - [`StatePublisher`] / [`CoverEventBus`]: state change publication
//! - [`CoverEntity`]: identity, supported features and attributes for the host
//!
//! ## Known limitations
//!
//! - An interrupted run does not compute a partial position; the reported
//!   position stays at its last known value.
//! - State is not persisted. Every start assumes closed with tilt 0,
//!   whatever the physical cover is doing.

mod config;
mod controller;
mod entity;
mod error;
mod event;
mod run;
mod state;

pub use config::*;
pub use controller::TimedMovementController;
pub use entity::{CoverAttributes, CoverEntity, CoverFeature};
pub use error::{CoverError, CoverResult};
pub use event::*;
pub use run::{cancellable_sleep, CancelSignal, RunOutcome, WaitOutcome};
pub use state::*;

pub use tilted_cover_actuator as actuator;
