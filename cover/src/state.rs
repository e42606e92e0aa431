//! Inferred cover state
//!
//! There is no position feedback. Everything here is derived from which
//! runs were started and whether they completed.

use serde::{Deserialize, Serialize};
use tilted_cover_actuator::Direction;

/// Fully open position / tilt
pub const FULLY_OPEN: u8 = 100;

/// Fully closed position / tilt
pub const FULLY_CLOSED: u8 = 0;

/// The kind of timed run occupying the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    Open,
    Close,
    OpenTilt,
    CloseTilt,
}

impl MovementKind {
    /// Relay the run energizes
    pub fn direction(&self) -> Direction {
        match self {
            MovementKind::Open | MovementKind::OpenTilt => Direction::Up,
            MovementKind::Close | MovementKind::CloseTilt => Direction::Down,
        }
    }

    pub fn is_tilt(&self) -> bool {
        matches!(self, MovementKind::OpenTilt | MovementKind::CloseTilt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Open => "open",
            MovementKind::Close => "close",
            MovementKind::OpenTilt => "open_tilt",
            MovementKind::CloseTilt => "close_tilt",
        }
    }
}

impl std::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Movement state machine view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPhase {
    Idle,
    Opening,
    Closing,
    TiltMoving,
}

/// Host-facing status string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverStatus {
    Open,
    Closed,
    Opening,
    Closing,
}

impl std::fmt::Display for CoverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverStatus::Open => write!(f, "open"),
            CoverStatus::Closed => write!(f, "closed"),
            CoverStatus::Opening => write!(f, "opening"),
            CoverStatus::Closing => write!(f, "closing"),
        }
    }
}

/// State owned by one controller.
///
/// `is_opening`/`is_closing` only ever reflect travel runs; tilt runs
/// show up in `movement` but leave both flags alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverState {
    pub is_opening: bool,
    pub is_closing: bool,
    pub is_closed: bool,
    /// 0 = fully closed, 100 = fully open
    pub position: u8,
    /// 0 = tilt closed, 100 = tilt open
    pub tilt_position: u8,
    /// Run currently occupying the controller, if any
    pub movement: Option<MovementKind>,
    /// Id of that run; a run that is no longer current cannot touch the flags
    #[serde(skip)]
    pub(crate) run_id: Option<u64>,
}

impl Default for CoverState {
    fn default() -> Self {
        Self {
            is_opening: false,
            is_closing: false,
            is_closed: true,
            position: FULLY_CLOSED,
            tilt_position: FULLY_CLOSED,
            movement: None,
            run_id: None,
        }
    }
}

impl CoverState {
    pub fn phase(&self) -> MovementPhase {
        if self.is_opening {
            MovementPhase::Opening
        } else if self.is_closing {
            MovementPhase::Closing
        } else if self.movement.is_some() {
            MovementPhase::TiltMoving
        } else {
            MovementPhase::Idle
        }
    }

    pub fn status(&self) -> CoverStatus {
        if self.is_opening {
            CoverStatus::Opening
        } else if self.is_closing {
            CoverStatus::Closing
        } else if self.is_closed {
            CoverStatus::Closed
        } else {
            CoverStatus::Open
        }
    }

    /// Mark a run as started; travel runs raise their direction flag
    pub(crate) fn begin(&mut self, id: u64, kind: MovementKind) {
        self.movement = Some(kind);
        self.run_id = Some(id);
        match kind {
            MovementKind::Open => self.is_opening = true,
            MovementKind::Close => self.is_closing = true,
            MovementKind::OpenTilt | MovementKind::CloseTilt => {}
        }
    }

    /// Retire run `id`; `completed` is false when it was cancelled or failed.
    ///
    /// Returns false, changing nothing, when `id` is not the current run.
    pub(crate) fn finish(&mut self, id: u64, kind: MovementKind, completed: bool) -> bool {
        if self.run_id != Some(id) {
            return false;
        }
        self.run_id = None;
        self.movement = None;
        self.is_opening = false;
        self.is_closing = false;

        if !completed {
            return true;
        }
        match kind {
            MovementKind::Open => {
                self.is_closed = false;
                self.position = FULLY_OPEN;
            }
            MovementKind::Close => {
                self.is_closed = true;
                self.position = FULLY_CLOSED;
            }
            MovementKind::OpenTilt => self.tilt_position = FULLY_OPEN,
            MovementKind::CloseTilt => self.tilt_position = FULLY_CLOSED,
        }
        true
    }
}
