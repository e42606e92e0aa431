//! Host-facing cover entity
//!
//! Wraps a controller with the identity and read model a host platform
//! needs to register and render the cover.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tilted_cover_actuator::SharedSwitch;
use tokio::sync::broadcast;

use crate::{
    CoverConfig, CoverEvent, CoverEventBus, CoverResult, CoverStatus, MovementPhase,
    TimedMovementController,
};

// =============================================================================
// Features
// =============================================================================

/// Cover capabilities a host can advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CoverFeature(u32);

impl CoverFeature {
    pub const OPEN: CoverFeature = CoverFeature(1);
    pub const CLOSE: CoverFeature = CoverFeature(2);
    pub const SET_POSITION: CoverFeature = CoverFeature(4);
    pub const STOP: CoverFeature = CoverFeature(8);
    pub const OPEN_TILT: CoverFeature = CoverFeature(16);
    pub const CLOSE_TILT: CoverFeature = CoverFeature(32);
    pub const STOP_TILT: CoverFeature = CoverFeature(64);
    pub const SET_TILT_POSITION: CoverFeature = CoverFeature(128);

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: CoverFeature) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CoverFeature {
    type Output = CoverFeature;

    fn bitor(self, rhs: CoverFeature) -> CoverFeature {
        CoverFeature(self.0 | rhs.0)
    }
}

/// Attributes a host publishes for the cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverAttributes {
    pub state: CoverStatus,
    pub is_opening: bool,
    pub is_closing: bool,
    pub is_closed: bool,
    pub current_position: u8,
    pub current_tilt_position: u8,
}

// =============================================================================
// Entity
// =============================================================================

/// A configured timed cover
pub struct CoverEntity {
    unique_id: String,
    bus: Arc<CoverEventBus>,
    controller: TimedMovementController,
}

impl CoverEntity {
    /// Build an entity from an already validated config
    pub fn new(unique_id: impl Into<String>, config: CoverConfig, switch: SharedSwitch) -> Self {
        let bus = Arc::new(CoverEventBus::default());
        let controller = TimedMovementController::new(config, switch, bus.clone());
        Self {
            unique_id: unique_id.into(),
            bus,
            controller,
        }
    }

    /// Build an entity from stored config entry data
    pub fn from_entry(entry_id: &str, data: &str, switch: SharedSwitch) -> CoverResult<Self> {
        let config = CoverConfig::from_json(data)?;
        tracing::info!(entry = entry_id, cover = %config.name, "Setting up timed cover");
        Ok(Self::new(entry_id, config, switch))
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.controller.config().name
    }

    /// Only the five timed movements are supported; there is no
    /// position tracking to serve set-position requests.
    pub fn supported_features(&self) -> CoverFeature {
        CoverFeature::OPEN
            | CoverFeature::CLOSE
            | CoverFeature::STOP
            | CoverFeature::OPEN_TILT
            | CoverFeature::CLOSE_TILT
    }

    pub fn controller(&self) -> &TimedMovementController {
        &self.controller
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoverEvent> {
        self.bus.subscribe()
    }

    pub fn attributes(&self) -> CoverAttributes {
        let state = self.controller.state();
        CoverAttributes {
            state: state.status(),
            is_opening: state.is_opening,
            is_closing: state.is_closing,
            is_closed: state.is_closed,
            current_position: state.position,
            current_tilt_position: state.tilt_position,
        }
    }

    pub fn phase(&self) -> MovementPhase {
        self.controller.phase()
    }

    // =========================================================================
    // Cover services
    // =========================================================================

    pub async fn open_cover(&self) -> CoverResult<()> {
        self.controller.open().await
    }

    pub async fn close_cover(&self) -> CoverResult<()> {
        self.controller.close().await
    }

    pub async fn stop_cover(&self) -> CoverResult<()> {
        self.controller.stop().await
    }

    pub async fn open_cover_tilt(&self) -> CoverResult<()> {
        self.controller.open_tilt().await
    }

    pub async fn close_cover_tilt(&self) -> CoverResult<()> {
        self.controller.close_tilt().await
    }
}

impl std::fmt::Debug for CoverEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverEntity")
            .field("unique_id", &self.unique_id)
            .field("controller", &self.controller)
            .finish()
    }
}
