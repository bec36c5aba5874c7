//! Piece movement
//!
//! Pieces fall at a constant rate: crossing the whole board takes
//! `row_travel_time * row_count` seconds however many rows there are.

use super::state::RoundState;

/// Advance every free piece by `delta` progress
pub fn advance(state: &mut RoundState, delta: f64) {
    for piece in state.pieces.iter_mut().filter(|p| !p.jammed) {
        piece.progress += delta;
    }
}
