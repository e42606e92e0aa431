//! Cover configuration
//!
//! Mirrors the config entry the host's setup flow stores for each cover:
//! a name, the two switch entities and four durations in seconds. Ranges
//! are checked here, at the configuration boundary; the controller trusts
//! whatever it is handed.

use crate::{CoverError, CoverResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Integration domain the config entries belong to
pub const DOMAIN: &str = "home_assistant_custom_tilted_cover";

/// Default full travel time (seconds)
pub const DEFAULT_TRAVEL_TIME: f64 = 25.0;

/// Default full tilt time (seconds)
pub const DEFAULT_TILT_TIME: f64 = 1.5;

/// Upper bound accepted for travel times (seconds)
pub const MAX_TRAVEL_TIME: f64 = 100.0;

/// Upper bound accepted for tilt times (seconds)
pub const MAX_TILT_TIME: f64 = 10.0;

fn default_travel_time() -> f64 {
    DEFAULT_TRAVEL_TIME
}

fn default_tilt_time() -> f64 {
    DEFAULT_TILT_TIME
}

/// Configuration for one timed cover
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverConfig {
    pub name: String,

    /// Relay that moves the cover up / opens the tilt
    #[serde(rename = "up_switch_entity_id")]
    pub up_actuator_id: String,

    /// Relay that moves the cover down / closes the tilt
    #[serde(rename = "down_switch_entity_id")]
    pub down_actuator_id: String,

    #[serde(default = "default_travel_time")]
    pub travel_time_up: f64,

    #[serde(default = "default_travel_time")]
    pub travel_time_down: f64,

    #[serde(default = "default_tilt_time")]
    pub tilt_time_open: f64,

    #[serde(default = "default_tilt_time")]
    pub tilt_time_close: f64,
}

impl CoverConfig {
    /// Create a config with default durations
    pub fn new(
        name: impl Into<String>,
        up_actuator_id: impl Into<String>,
        down_actuator_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            up_actuator_id: up_actuator_id.into(),
            down_actuator_id: down_actuator_id.into(),
            travel_time_up: DEFAULT_TRAVEL_TIME,
            travel_time_down: DEFAULT_TRAVEL_TIME,
            tilt_time_open: DEFAULT_TILT_TIME,
            tilt_time_close: DEFAULT_TILT_TIME,
        }
    }

    pub fn with_travel_times(mut self, up: f64, down: f64) -> Self {
        self.travel_time_up = up;
        self.travel_time_down = down;
        self
    }

    pub fn with_tilt_times(mut self, open: f64, close: f64) -> Self {
        self.tilt_time_open = open;
        self.tilt_time_close = close;
        self
    }

    /// Parse and validate config entry data
    pub fn from_json(data: &str) -> CoverResult<Self> {
        let config: CoverConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check identifiers and duration ranges
    pub fn validate(&self) -> CoverResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoverError::invalid("name must not be empty"));
        }
        if self.up_actuator_id.trim().is_empty() {
            return Err(CoverError::invalid("up switch must be set"));
        }
        if self.down_actuator_id.trim().is_empty() {
            return Err(CoverError::invalid("down switch must be set"));
        }
        if self.up_actuator_id == self.down_actuator_id {
            return Err(CoverError::invalid(format!(
                "up and down switch must differ (both are {})",
                self.up_actuator_id
            )));
        }

        check_duration("travel_time_up", self.travel_time_up, MAX_TRAVEL_TIME)?;
        check_duration("travel_time_down", self.travel_time_down, MAX_TRAVEL_TIME)?;
        check_duration("tilt_time_open", self.tilt_time_open, MAX_TILT_TIME)?;
        check_duration("tilt_time_close", self.tilt_time_close, MAX_TILT_TIME)?;
        Ok(())
    }

    pub fn travel_up(&self) -> Duration {
        seconds(self.travel_time_up)
    }

    pub fn travel_down(&self) -> Duration {
        seconds(self.travel_time_down)
    }

    pub fn tilt_open(&self) -> Duration {
        seconds(self.tilt_time_open)
    }

    pub fn tilt_close(&self) -> Duration {
        seconds(self.tilt_time_close)
    }
}

fn check_duration(key: &str, value: f64, max: f64) -> CoverResult<()> {
    if !value.is_finite() || value <= 0.0 || value > max {
        return Err(CoverError::invalid(format!(
            "{} must be in (0, {}] seconds, got {}",
            key, max, value
        )));
    }
    Ok(())
}

// Config values are trusted here; anything negative or non-finite maps to zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
