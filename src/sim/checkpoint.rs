//! Checkpoints and fail fixes
//!
//! A single snapshot of the round, replaced at every interaction boundary.
//! Snapshots are owned clones, so later mutation of the live state never
//! reaches them. A fix is a narrow edit of a snapshot copy that undoes the
//! cause of a failure; the simulation swaps the corrected copy in and play
//! continues.

use super::deflector;
use super::state::RoundState;

/// Holds the most recent snapshot
#[derive(Debug, Clone, Default)]
pub struct CheckpointManager {
    checkpoint: Option<RoundState>,
}

impl CheckpointManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `state`, replacing any previous checkpoint
    pub fn save(&mut self, state: &RoundState) {
        self.checkpoint = Some(state.clone());
    }

    /// Independent copy of the latest checkpoint
    pub fn restore(&self) -> Option<RoundState> {
        self.checkpoint.clone()
    }

    pub fn latest(&self) -> Option<&RoundState> {
        self.checkpoint.as_ref()
    }

    pub fn clear(&mut self) {
        self.checkpoint = None;
    }
}

/// Remove the most recently jammed piece in `lane` and resume play
///
/// The lane's jam counter only drops when a piece was actually removed.
pub fn apply_overflow_fix(state: &mut RoundState, lane: u8) {
    let latest = state
        .pieces
        .iter()
        .rposition(|p| p.jammed && p.lane == lane);
    if let Some(index) = latest {
        let piece = state.pieces.remove(index);
        if let Some(count) = state.jam_counts.get_mut(&lane) {
            *count = count.saturating_sub(1);
        }
        log::debug!("Overflow fix removed piece {} from lane {}", piece.id, lane);
    }
    state.clear_failure();
    state.overflow_margin = None;
}

/// Remove the most recently placed deflector and resume play
pub fn apply_misbank_fix(state: &mut RoundState) {
    if let Some(removed) = deflector::remove_latest(&mut state.deflectors) {
        log::debug!("Misbank fix removed deflector {} at row {}", removed.id, removed.row);
    }
    state.clear_failure();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoundConfig;
    use crate::sim::state::{Color, FailReason, Phase, Piece, Slot};

    fn jammed(id: u32, lane: u8) -> Piece {
        let mut piece = Piece::new(id, Color::Red, lane);
        piece.progress = 0.5;
        piece.jammed = true;
        piece.jammed_at_row = Some(6);
        piece
    }

    #[test]
    fn test_checkpoint_is_isolated_from_live_state() {
        let mut manager = CheckpointManager::new();
        let mut state = RoundState::new();
        state.pieces.push(Piece::new(0, Color::Green, 1));
        manager.save(&state);

        state.pieces[0].lane = 3;
        state.pieces.push(Piece::new(1, Color::Blue, 3));
        state.banked_count = 9;

        let saved = manager.latest().unwrap();
        assert_eq!(saved.pieces.len(), 1);
        assert_eq!(saved.pieces[0].lane, 1);
        assert_eq!(saved.banked_count, 0);

        // Editing a restored copy leaves the checkpoint alone
        let mut copy = manager.restore().unwrap();
        copy.pieces.clear();
        assert_eq!(manager.latest().unwrap().pieces.len(), 1);
    }

    #[test]
    fn test_save_overwrites() {
        let mut manager = CheckpointManager::new();
        let mut state = RoundState::new();
        manager.save(&state);
        state.tick = 77;
        manager.save(&state);
        assert_eq!(manager.latest().map(|s| s.tick), Some(77));
        manager.clear();
        assert!(manager.restore().is_none());
    }

    #[test]
    fn test_overflow_fix_removes_latest_jam_in_lane() {
        let mut state = RoundState::new();
        state.pieces.push(jammed(0, 1));
        state.pieces.push(jammed(1, 2));
        state.pieces.push(jammed(2, 1));
        state.jam_counts.insert(1, 2);
        state.jam_counts.insert(2, 1);
        state.fail(FailReason::Overflow { lane: 1 });
        state.overflow_margin = Some(0);

        apply_overflow_fix(&mut state, 1);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.fail_reason, None);
        assert_eq!(state.overflow_margin, None);
        assert_eq!(state.jam_count(1), 1);
        assert_eq!(state.jam_count(2), 1);
        let ids: Vec<u32> = state.pieces.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_overflow_fix_without_jammed_piece() {
        let mut state = RoundState::new();
        state.pieces.push(Piece::new(0, Color::Red, 0));
        state.jam_counts.insert(0, 2);
        state.fail(FailReason::Overflow { lane: 0 });

        apply_overflow_fix(&mut state, 0);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.jam_count(0), 2);
        assert_eq!(state.pieces.len(), 1);
    }

    #[test]
    fn test_misbank_fix_mirrors_undo() {
        let config = RoundConfig::default();
        let mut state = RoundState::new();
        state.phase = Phase::Playing;
        deflector::place(&mut state, 3, Slot::A, &config).unwrap();
        deflector::place(&mut state, 5, Slot::C, &config).unwrap();
        state.fail(FailReason::Misbank { color: Color::Red, lane: 1 });

        apply_misbank_fix(&mut state);
        assert_eq!(state.phase, Phase::Playing);
        assert_eq!(state.fail_reason, None);
        assert_eq!(state.deflectors.len(), 1);
        assert_eq!(state.deflectors[0].id, 0);
        assert_eq!(state.total_placed, 2);
    }
}
