//! Bank validation
//!
//! Every free piece that has reached the bank row is checked against the
//! bank under its lane. Pieces are scanned newest first and the first
//! misbank ends the scan: banks already credited this step stay credited.

use super::event::{EventQueue, RoundEvent};
use super::state::{Color, FailReason, RoundState};

/// Bank or reject pieces sitting on the bank row
///
/// Returns the reason if a piece misbanked.
pub fn resolve(state: &mut RoundState, events: &mut EventQueue) -> Option<FailReason> {
    for index in (0..state.pieces.len()).rev() {
        let piece = &state.pieces[index];
        if !piece.at_bank() {
            continue;
        }

        let (id, color, lane) = (piece.id, piece.color, piece.lane);
        if color == Color::bank_for_lane(lane) {
            state.pieces.remove(index);
            state.banked_count += 1;
            log::debug!("Piece {} banked {} ({} total)", id, color.as_str(), state.banked_count);
            events.push(RoundEvent::PieceBanked { id, color });
        } else {
            let reason = FailReason::Misbank { color, lane };
            log::debug!("Piece {} misbanked {} in lane {}", id, color.as_str(), lane);
            state.fail(reason);
            events.push(RoundEvent::PieceMisbanked { id, color, lane });
            return Some(reason);
        }
    }
    None
}
