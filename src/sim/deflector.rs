//! Deflector placement, cap enforcement, charge use and undo

use super::state::{Deflector, DeflectorId, Phase, RoundState, Slot};
use crate::config::RoundConfig;
use crate::error::{PlacementError, UndoError};

/// Check placement preconditions without mutating anything
///
/// Checked in order: phase, row range, active cap, occupied position.
pub fn check_placement(
    state: &RoundState,
    row: u32,
    slot: Slot,
    config: &RoundConfig,
) -> Result<(), PlacementError> {
    if state.phase != Phase::Playing {
        return Err(PlacementError::WrongPhase(state.phase));
    }
    if !config.row_in_range(row) {
        return Err(PlacementError::RowOutOfRange {
            row,
            row_count: config.row_count,
        });
    }
    if state.deflectors.len() >= config.deflector_cap {
        return Err(PlacementError::CapReached {
            cap: config.deflector_cap,
        });
    }
    if occupant(state, row, slot).is_some() {
        return Err(PlacementError::SlotOccupied { row, slot });
    }
    Ok(())
}

/// Whether a deflector could go at (row, slot) right now
pub fn can_place(state: &RoundState, row: u32, slot: Slot, config: &RoundConfig) -> bool {
    check_placement(state, row, slot, config).is_ok()
}

/// Place a fully charged deflector
pub fn place(
    state: &mut RoundState,
    row: u32,
    slot: Slot,
    config: &RoundConfig,
) -> Result<DeflectorId, PlacementError> {
    check_placement(state, row, slot, config)?;

    let id = state.total_placed;
    state.deflectors.push(Deflector {
        id,
        row,
        slot,
        charges: config.deflector_charges,
        placement_order: state.total_placed,
        placed_at_tick: state.tick,
    });
    state.total_placed += 1;

    log::debug!(
        "Placed deflector {} at row {} slot {} ({} active)",
        id,
        row,
        slot.as_str(),
        state.deflectors.len()
    );
    Ok(id)
}

/// Remove the most recently placed deflector still on the board
pub fn undo(state: &mut RoundState) -> Result<Deflector, UndoError> {
    if state.phase != Phase::Playing {
        return Err(UndoError::WrongPhase(state.phase));
    }
    let removed = remove_latest(&mut state.deflectors).ok_or(UndoError::NothingToUndo)?;
    log::debug!("Undid deflector {} at row {}", removed.id, removed.row);
    Ok(removed)
}

/// Remove and return the deflector with the highest placement order
pub fn remove_latest(deflectors: &mut Vec<Deflector>) -> Option<Deflector> {
    let index = deflectors
        .iter()
        .enumerate()
        .max_by_key(|(_, d)| d.placement_order)
        .map(|(i, _)| i)?;
    Some(deflectors.remove(index))
}

/// Index of the deflector sitting at (row, slot)
pub fn occupant(state: &RoundState, row: u32, slot: Slot) -> Option<usize> {
    state
        .deflectors
        .iter()
        .position(|d| d.row == row && d.slot == slot)
}

/// Index of a live deflector at `row` on any slot bordering `lane`
///
/// The left slot is checked first; the first live match wins.
pub fn find_for_lane(state: &RoundState, lane: u8, row: u32) -> Option<usize> {
    Slot::bordering(lane).find_map(|slot| {
        state
            .deflectors
            .iter()
            .position(|d| d.row == row && d.slot == slot && !d.is_expired())
    })
}

/// Spend one charge, removing the deflector when it runs out
///
/// Returns the deflector as it was after the charge was spent and whether
/// it expired.
pub fn consume_charge(state: &mut RoundState, index: usize) -> (Deflector, bool) {
    let deflector = &mut state.deflectors[index];
    deflector.charges = deflector.charges.saturating_sub(1);
    let snapshot = deflector.clone();
    let expired = snapshot.is_expired();
    if expired {
        state.deflectors.remove(index);
    }
    (snapshot, expired)
}
