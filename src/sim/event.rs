//! Round events
//!
//! Output only. The simulation appends while ticking and the caller drains
//! between ticks; nothing in the core reads an event back.

use serde::{Deserialize, Serialize};

use super::level::GateType;
use super::state::{Color, DeflectorId, FailReason, PieceId, Slot};

/// What a gate did to the piece that reached it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Pass,
    Jam,
    Repaint,
}

/// Something that happened during a fixed step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    PieceSpawned {
        id: PieceId,
        color: Color,
        lane: u8,
    },
    PieceBanked {
        id: PieceId,
        color: Color,
    },
    PieceMisbanked {
        id: PieceId,
        color: Color,
        lane: u8,
    },
    DeflectorPlaced {
        id: DeflectorId,
        row: u32,
        slot: Slot,
        active: usize,
    },
    DeflectorTriggered {
        id: DeflectorId,
        row: u32,
        slot: Slot,
        piece: PieceId,
        remaining: u32,
    },
    /// Charges ran out and the deflector left the board
    DeflectorExpired {
        id: DeflectorId,
        row: u32,
        slot: Slot,
    },
    /// Removed by undo
    DeflectorRemoved {
        id: DeflectorId,
        row: u32,
        slot: Slot,
    },
    GateTriggered {
        gate: GateType,
        lane: u8,
        row: u32,
        piece: PieceId,
        outcome: GateOutcome,
    },
    RoundWon {
        deflectors_placed: u32,
        banked: u32,
    },
    RoundFailed {
        reason: FailReason,
        margin: Option<u32>,
    },
    TutorialPaused,
}

/// Append-then-drain event buffer
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<RoundEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: RoundEvent) {
        self.events.push(event);
    }

    /// Take all pending events, leaving the queue empty
    pub fn drain(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
