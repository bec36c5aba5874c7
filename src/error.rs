//! Typed precondition failures
//!
//! None of these are exceptional: a rejected placement or an empty undo is
//! an expected outcome the UI simply ignores. The boolean convenience
//! methods on [`crate::sim::Simulation`] collapse them to `false`.

use thiserror::Error;

use crate::sim::{Phase, Slot};

/// Why a deflector could not be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("deflectors can only be placed while playing (phase is {0:?})")]
    WrongPhase(Phase),

    #[error("row {row} is outside the board (1..={row_count})")]
    RowOutOfRange { row: u32, row_count: u32 },

    #[error("{cap} deflectors already active")]
    CapReached { cap: usize },

    #[error("slot {slot:?} on row {row} is already occupied")]
    SlotOccupied { row: u32, slot: Slot },
}

/// Why an undo did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UndoError {
    #[error("undo is only available while playing (phase is {0:?})")]
    WrongPhase(Phase),

    #[error("no active deflector to undo")]
    NothingToUndo,
}

/// Why a fix-and-resume could not be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FixError {
    #[error("round has not failed (phase is {0:?})")]
    NotFailed(Phase),

    #[error("no checkpoint recorded for this attempt")]
    NoCheckpoint,
}

/// Level descriptor parse failure
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("invalid level descriptor: {0}")]
    Parse(#[from] serde_json::Error),
}
