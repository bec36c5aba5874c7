//! Lanefall - a lane-and-deflector color sorting puzzle engine
//!
//! Core modules:
//! - `sim`: Deterministic round simulation (spawning, gates, deflectors, banking)
//! - `config`: Data-driven round tuning
//! - `error`: Typed precondition failures
//!
//! The core performs no I/O and draws nothing. Callers drive a round through
//! [`sim::Simulation::tick`] and drain [`sim::RoundEvent`]s between calls.

pub mod config;
pub mod error;
pub mod sim;

pub use config::RoundConfig;
pub use error::{FixError, LevelError, PlacementError, UndoError};

/// Locked game constants (defaults for [`RoundConfig`])
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;

    /// Board dimensions
    pub const LANE_COUNT: u8 = 4;
    pub const ROW_COUNT: u32 = 12;
    /// Boundary slots between the four lanes
    pub const SLOT_COUNT: u8 = 3;

    /// Seconds a piece needs to cross one row (3.96 s for the whole board)
    pub const ROW_TRAVEL_TIME: f64 = 0.33;

    /// Spawn pacing
    pub const WAVE_SIZE: usize = 4;
    pub const WAVES_PER_LEVEL: usize = 6;
    pub const INTER_PIECE_SPACING: f64 = 0.6;
    pub const BREATH_DURATION: f64 = 1.2;
    pub const SPAWN_PREVIEW_COUNT: usize = 8;

    /// Deflectors
    pub const ACTIVE_DEFLECTOR_CAP: usize = 3;
    pub const DEFLECTOR_CHARGES: u32 = 3;

    /// Gates
    pub const DEFAULT_CYCLE_EVERY: u32 = 2;
    /// Jams in one lane that end the round
    pub const JAM_THRESHOLD: u32 = 3;

    /// Preview phase (banner, then board reveal)
    pub const PREVIEW_BANNER_DURATION: f64 = 0.5;
    pub const PREVIEW_BOARD_DURATION: f64 = 1.5;

    /// Par thresholds (deflectors placed)
    pub const THREE_STAR_MAX: u32 = 6;
    pub const TWO_STAR_MAX: u32 = 8;

    /// Replay runaway guard (60 seconds of fixed steps)
    pub const REPLAY_STEP_CEILING: u32 = 60 * 60;
}
