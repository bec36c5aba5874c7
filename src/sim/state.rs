//! Round state and core simulation types
//!
//! Everything a checkpoint must capture lives in [`RoundState`]. It is plain
//! data: the subsystems in this module tree mutate it through `&mut`, and
//! only the orchestrator owns it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::SLOT_COUNT;

/// Stable piece identity (spawn order)
pub type PieceId = u32;
/// Stable deflector identity (placement order)
pub type DeflectorId = u32;

/// Piece colors; each lane's bank accepts exactly one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Yellow, Color::Blue];

    /// Color the bank at the bottom of `lane` accepts
    pub fn bank_for_lane(lane: u8) -> Color {
        match lane {
            1 => Color::Green,
            2 => Color::Yellow,
            3 => Color::Blue,
            _ => Color::Red,
        }
    }

    /// Lane whose bank accepts this color
    pub fn home_lane(&self) -> u8 {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Yellow => 2,
            Color::Blue => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
        }
    }
}

/// Boundary slot between two adjacent lanes
///
/// `A` sits between lanes 0 and 1, `B` between 1 and 2, `C` between 2 and 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    A,
    B,
    C,
}

impl Slot {
    pub fn from_index(index: u8) -> Option<Slot> {
        match index {
            0 => Some(Slot::A),
            1 => Some(Slot::B),
            2 => Some(Slot::C),
            _ => None,
        }
    }

    pub fn index(&self) -> u8 {
        match self {
            Slot::A => 0,
            Slot::B => 1,
            Slot::C => 2,
        }
    }

    /// The (left, right) lanes this slot separates
    pub fn adjacent_lanes(&self) -> (u8, u8) {
        let left = self.index();
        (left, left + 1)
    }

    /// Lane on the other side of this slot from `lane`
    pub fn opposite_lane(&self, lane: u8) -> u8 {
        let (left, right) = self.adjacent_lanes();
        if lane == left { right } else { left }
    }

    /// Slots bordering `lane`, left side first
    ///
    /// Outer lanes border one slot, inner lanes two.
    pub fn bordering(lane: u8) -> impl Iterator<Item = Slot> {
        let left = lane.checked_sub(1).and_then(Slot::from_index);
        let right = if lane < SLOT_COUNT {
            Slot::from_index(lane)
        } else {
            None
        };
        left.into_iter().chain(right)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::A => "a",
            Slot::B => "b",
            Slot::C => "c",
        }
    }
}

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Level banner and board reveal, nothing moves
    Preview,
    /// Active play
    Playing,
    /// Held before the first spawn until the tutorial overlay is dismissed
    TutorialPaused,
    /// Suspended by the player
    Paused,
    /// All pieces resolved
    Won,
    /// Misbank or overflow
    Failed,
}

impl Phase {
    /// Phases in which fixed steps run
    pub fn is_ticking(&self) -> bool {
        matches!(self, Phase::Preview | Phase::Playing)
    }

    /// Phases that end an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Won | Phase::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preview => "preview",
            Phase::Playing => "playing",
            Phase::TutorialPaused => "tutorial_paused",
            Phase::Paused => "paused",
            Phase::Won => "won",
            Phase::Failed => "failed",
        }
    }
}

/// Why a round failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailReason {
    /// A piece reached a bank that does not accept its color
    Misbank { color: Color, lane: u8 },
    /// A lane collected too many jammed pieces
    Overflow { lane: u8 },
}

/// A colored token travelling down a lane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub color: Color,
    /// Lane index (0..4)
    pub lane: u8,
    /// 0.0 = spawn row, 1.0 = bank row
    pub progress: f64,
    pub jammed: bool,
    /// Gate row that jammed this piece
    #[serde(default)]
    pub jammed_at_row: Option<u32>,
}

impl Piece {
    pub fn new(id: PieceId, color: Color, lane: u8) -> Self {
        Self {
            id,
            color,
            lane,
            progress: 0.0,
            jammed: false,
            jammed_at_row: None,
        }
    }

    /// Reached the bank row and still free to resolve
    pub fn at_bank(&self) -> bool {
        !self.jammed && self.progress >= 1.0
    }
}

/// Integer row for a progress value, clamped to the board
pub fn row_for_progress(progress: f64, row_count: u32) -> u32 {
    let clamped = progress.clamp(0.0, 1.0);
    (clamped * row_count as f64) as u32
}

/// A player-placed, limited-charge lane switch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deflector {
    pub id: DeflectorId,
    /// 1-indexed board row
    pub row: u32,
    pub slot: Slot,
    /// Remaining deflections
    pub charges: u32,
    /// Monotonic placement counter value (undo order)
    pub placement_order: u32,
    /// Tick the deflector was placed on
    pub placed_at_tick: u64,
}

impl Deflector {
    pub fn is_expired(&self) -> bool {
        self.charges == 0
    }
}

/// Gate position on the board (a gate is identified by where it sits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GatePos {
    pub lane: u8,
    pub row: u32,
}

/// Per-gate count of pieces that reached it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateEncounter {
    pub pos: GatePos,
    pub count: u32,
}

/// Complete round state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Current phase
    pub phase: Phase,
    /// Simulated seconds since the round started
    pub elapsed: f64,
    /// Fixed steps executed
    pub tick: u64,

    /// Pieces on the board, in spawn order
    pub pieces: Vec<Piece>,
    /// Pieces spawned so far (also the next piece id)
    pub spawned_count: u32,
    /// Pieces that reached the matching bank
    pub banked_count: u32,

    /// Active deflectors, in placement order
    pub deflectors: Vec<Deflector>,
    /// Deflectors ever placed this attempt; never decreases
    pub total_placed: u32,

    /// Lane -> jammed pieces
    pub jam_counts: BTreeMap<u8, u32>,
    pub fail_reason: Option<FailReason>,
    /// Jams still missing before overflow, as of the latest jam before any failure
    pub overflow_margin: Option<u32>,

    /// Seconds spent in the preview phase
    pub preview_elapsed: f64,

    // === Wave tracking ===
    pub wave_index: usize,
    pub spawned_in_wave: usize,
    pub since_last_spawn: f64,
    pub breathing: bool,
    pub breath_elapsed: f64,

    /// Cycling-gate encounter counters
    pub gate_encounters: Vec<GateEncounter>,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundState {
    /// Fresh state at the start of the preview
    pub fn new() -> Self {
        Self {
            phase: Phase::Preview,
            elapsed: 0.0,
            tick: 0,
            pieces: Vec::new(),
            spawned_count: 0,
            banked_count: 0,
            deflectors: Vec::new(),
            total_placed: 0,
            jam_counts: BTreeMap::new(),
            fail_reason: None,
            overflow_margin: None,
            preview_elapsed: 0.0,
            wave_index: 0,
            spawned_in_wave: 0,
            since_last_spawn: 0.0,
            breathing: false,
            breath_elapsed: 0.0,
            gate_encounters: Vec::new(),
        }
    }

    /// Jams recorded in `lane`
    pub fn jam_count(&self, lane: u8) -> u32 {
        self.jam_counts.get(&lane).copied().unwrap_or(0)
    }

    /// Pieces stuck at a gate
    pub fn jammed_count(&self) -> usize {
        self.pieces.iter().filter(|p| p.jammed).count()
    }

    /// Pieces still travelling
    pub fn moving_count(&self) -> usize {
        self.pieces.iter().filter(|p| !p.jammed).count()
    }

    /// Encounters recorded at a gate so far
    pub fn encounters_at(&self, pos: GatePos) -> u32 {
        self.gate_encounters
            .iter()
            .find(|e| e.pos == pos)
            .map(|e| e.count)
            .unwrap_or(0)
    }

    /// Count one more encounter at `pos`, returning the count before it
    pub fn record_encounter(&mut self, pos: GatePos) -> u32 {
        match self.gate_encounters.iter_mut().find(|e| e.pos == pos) {
            Some(entry) => {
                let before = entry.count;
                entry.count += 1;
                before
            }
            None => {
                self.gate_encounters.push(GateEncounter { pos, count: 1 });
                0
            }
        }
    }

    /// Move the round into the failed phase
    pub fn fail(&mut self, reason: FailReason) {
        self.phase = Phase::Failed;
        self.fail_reason = Some(reason);
    }

    /// Return a failed round to play, clearing the fail bookkeeping
    pub fn clear_failure(&mut self) {
        self.phase = Phase::Playing;
        self.fail_reason = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_colors_match_home_lanes() {
        for color in Color::ALL {
            assert_eq!(Color::bank_for_lane(color.home_lane()), color);
        }
    }

    #[test]
    fn test_bordering_slots() {
        assert_eq!(Slot::bordering(0).collect::<Vec<_>>(), vec![Slot::A]);
        assert_eq!(Slot::bordering(1).collect::<Vec<_>>(), vec![Slot::A, Slot::B]);
        assert_eq!(Slot::bordering(2).collect::<Vec<_>>(), vec![Slot::B, Slot::C]);
        assert_eq!(Slot::bordering(3).collect::<Vec<_>>(), vec![Slot::C]);
    }

    #[test]
    fn test_opposite_lane() {
        assert_eq!(Slot::A.opposite_lane(0), 1);
        assert_eq!(Slot::A.opposite_lane(1), 0);
        assert_eq!(Slot::C.opposite_lane(3), 2);
    }

    #[test]
    fn test_row_for_progress_clamps() {
        assert_eq!(row_for_progress(-0.1, 12), 0);
        assert_eq!(row_for_progress(0.5, 12), 6);
        assert_eq!(row_for_progress(1.0, 12), 12);
        assert_eq!(row_for_progress(1.3, 12), 12);
    }

    #[test]
    fn test_record_encounter_counts_per_gate() {
        let mut state = RoundState::new();
        let a = GatePos { lane: 1, row: 4 };
        let b = GatePos { lane: 2, row: 4 };
        assert_eq!(state.record_encounter(a), 0);
        assert_eq!(state.record_encounter(a), 1);
        assert_eq!(state.record_encounter(b), 0);
        assert_eq!(state.encounters_at(a), 2);
        assert_eq!(state.encounters_at(b), 1);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut state = RoundState::new();
        state.pieces.push(Piece::new(0, Color::Red, 0));
        let snapshot = state.clone();
        state.pieces[0].lane = 3;
        state.jam_counts.insert(0, 2);
        assert_eq!(snapshot.pieces[0].lane, 0);
        assert_eq!(snapshot.jam_count(0), 0);
    }
}
