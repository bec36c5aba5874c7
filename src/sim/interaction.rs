//! Row-boundary interactions
//!
//! When a free piece crosses into a new row this step it gets exactly one
//! boundary event, in a fixed order:
//!
//! 1. The gate at (lane, row), if any. A jam ends the piece's turn.
//! 2. A deflector on a slot bordering the lane the piece entered in. At most
//!    one deflection per crossing; the left slot is checked first.
//!
//! Pieces are visited in spawn order, and every crossing is resolved even
//! after a lane overflows in the same step. A later overflow replaces the
//! reported reason.

use super::deflector;
use super::event::{EventQueue, GateOutcome, RoundEvent};
use super::level::{Gate, GateKind, LevelDescriptor};
use super::state::{Color, FailReason, Phase, RoundState, row_for_progress};
use crate::config::RoundConfig;

/// Resolve boundary crossings for a step in which pieces moved `delta`
///
/// Returns the number of events emitted.
pub fn resolve(
    state: &mut RoundState,
    level: &LevelDescriptor,
    config: &RoundConfig,
    delta: f64,
    events: &mut EventQueue,
) -> usize {
    let before = events.len();

    for index in 0..state.pieces.len() {
        let piece = &state.pieces[index];
        if piece.jammed {
            continue;
        }

        let previous_row = row_for_progress(piece.progress - delta, config.row_count);
        let row = row_for_progress(piece.progress, config.row_count);
        if row <= previous_row || !config.row_in_range(row) {
            continue;
        }

        let entry_lane = piece.lane;
        if let Some(gate) = level.gate_at(entry_lane, row) {
            let outcome = apply_gate(state, index, gate, config);
            events.push(RoundEvent::GateTriggered {
                gate: gate.kind.gate_type(),
                lane: gate.lane,
                row: gate.row,
                piece: state.pieces[index].id,
                outcome,
            });
            if outcome == GateOutcome::Jam {
                continue;
            }
        }

        apply_deflector(state, index, entry_lane, row, events);
    }

    events.len() - before
}

/// Apply a gate's effect to the piece at `index`
fn apply_gate(state: &mut RoundState, index: usize, gate: &Gate, config: &RoundConfig) -> GateOutcome {
    match &gate.kind {
        GateKind::Color { allowed } => {
            if state.pieces[index].color == *allowed {
                GateOutcome::Pass
            } else {
                jam(state, index, gate.row, config);
                GateOutcome::Jam
            }
        }
        GateKind::Cycle { colors, every } => {
            // Counted even when the cycle is empty: every arrival is an encounter
            let encounters = state.record_encounter(gate.pos());
            let Some(allowed) = cycle_color(colors, *every, encounters) else {
                return GateOutcome::Pass;
            };
            if state.pieces[index].color == allowed {
                GateOutcome::Pass
            } else {
                jam(state, index, gate.row, config);
                GateOutcome::Jam
            }
        }
        GateKind::Repaint { from, to } => {
            let piece = &mut state.pieces[index];
            if piece.color == *from {
                piece.color = *to;
                GateOutcome::Repaint
            } else {
                GateOutcome::Pass
            }
        }
    }
}

/// Allowed color of a cycling gate after `encounters` earlier arrivals
pub fn cycle_color(colors: &[Color], every: u32, encounters: u32) -> Option<Color> {
    if colors.is_empty() {
        return None;
    }
    let step = (encounters / every.max(1)) as usize;
    Some(colors[step % colors.len()])
}

/// Jam the piece at `index`, failing the round if its lane overflows
fn jam(state: &mut RoundState, index: usize, row: u32, config: &RoundConfig) {
    let piece = &mut state.pieces[index];
    piece.jammed = true;
    piece.jammed_at_row = Some(row);
    let (id, lane) = (piece.id, piece.lane);

    let count = state.jam_counts.entry(lane).or_insert(0);
    *count += 1;
    let count = *count;
    // A failed round keeps the margin of the jam that failed it
    if state.phase != Phase::Failed {
        state.overflow_margin = Some(config.jam_threshold.saturating_sub(count));
    }

    log::debug!("Piece {} jammed in lane {} at row {} ({} jams)", id, lane, row, count);

    if count >= config.jam_threshold {
        state.fail(FailReason::Overflow { lane });
    }
}

/// Deflect the piece at `index` if a live deflector borders its entry lane
fn apply_deflector(state: &mut RoundState, index: usize, entry_lane: u8, row: u32, events: &mut EventQueue) {
    let Some(slot_index) = deflector::find_for_lane(state, entry_lane, row) else {
        return;
    };

    let slot = state.deflectors[slot_index].slot;
    let piece = &mut state.pieces[index];
    piece.lane = slot.opposite_lane(entry_lane);
    let (piece_id, new_lane) = (piece.id, piece.lane);

    let (spent, expired) = deflector::consume_charge(state, slot_index);
    log::debug!(
        "Deflector {} moved piece {} from lane {} to lane {} ({} charges left)",
        spent.id,
        piece_id,
        entry_lane,
        new_lane,
        spent.charges
    );

    events.push(RoundEvent::DeflectorTriggered {
        id: spent.id,
        row,
        slot,
        piece: piece_id,
        remaining: spent.charges,
    });
    if expired {
        events.push(RoundEvent::DeflectorExpired {
            id: spent.id,
            row,
            slot,
        });
    }
}
