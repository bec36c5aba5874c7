//! Round tuning
//!
//! Every knob the simulation reads lives here so tests and levels can vary
//! pacing without touching the locked defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Round tuning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Fixed step length in seconds
    pub fixed_dt: f64,
    /// Rows between the spawn row and the bank row (bank row included)
    pub row_count: u32,
    /// Seconds to cross one row
    pub row_travel_time: f64,

    // === Spawning ===
    /// Seconds between pieces inside a wave
    pub inter_piece_spacing: f64,
    /// Seconds of rest between waves
    pub breath_duration: f64,
    /// Pieces shown by the "next" strip
    pub spawn_preview_count: usize,

    // === Preview phase ===
    pub preview_banner_duration: f64,
    pub preview_board_duration: f64,

    // === Deflectors ===
    /// Maximum simultaneously active deflectors
    pub deflector_cap: usize,
    /// Deflections before a deflector expires
    pub deflector_charges: u32,

    // === Gates ===
    /// Jams in one lane that fail the round
    pub jam_threshold: u32,

    // === Verification ===
    /// Replay runaway guard in fixed steps
    pub replay_step_ceiling: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            fixed_dt: SIM_DT,
            row_count: ROW_COUNT,
            row_travel_time: ROW_TRAVEL_TIME,

            inter_piece_spacing: INTER_PIECE_SPACING,
            breath_duration: BREATH_DURATION,
            spawn_preview_count: SPAWN_PREVIEW_COUNT,

            preview_banner_duration: PREVIEW_BANNER_DURATION,
            preview_board_duration: PREVIEW_BOARD_DURATION,

            deflector_cap: ACTIVE_DEFLECTOR_CAP,
            deflector_charges: DEFLECTOR_CHARGES,

            jam_threshold: JAM_THRESHOLD,

            replay_step_ceiling: REPLAY_STEP_CEILING,
        }
    }
}

impl RoundConfig {
    /// Total preview time before play begins
    pub fn total_preview_duration(&self) -> f64 {
        self.preview_banner_duration + self.preview_board_duration
    }

    /// Seconds for a piece to travel from spawn to bank
    pub fn board_travel_time(&self) -> f64 {
        self.row_travel_time * self.row_count as f64
    }

    /// Progress a moving piece gains over `dt` seconds
    pub fn progress_for(&self, dt: f64) -> f64 {
        dt / self.board_travel_time()
    }

    /// Progress gained per fixed step
    pub fn progress_per_step(&self) -> f64 {
        self.progress_for(self.fixed_dt)
    }

    /// Whether `row` is a placeable board row (1-indexed)
    pub fn row_in_range(&self, row: u32) -> bool {
        (1..=self.row_count).contains(&row)
    }
}
