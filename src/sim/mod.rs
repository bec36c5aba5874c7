//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (level generation)
//! - Stable iteration order (spawn order, sorted before hashing)
//! - No rendering, audio or platform dependencies

pub mod bank;
pub mod checkpoint;
pub mod deflector;
pub mod event;
pub mod hash;
pub mod interaction;
pub mod level;
pub mod movement;
pub mod replay;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod tick;

pub use checkpoint::{CheckpointManager, apply_misbank_fix, apply_overflow_fix};
pub use event::{EventQueue, GateOutcome, RoundEvent};
pub use hash::state_digest;
pub use level::{Gate, GateKind, GateType, LevelDescriptor, TutorialConfig, WaveEntry, generate_level};
pub use replay::{Command, CommandRecorder, ReplayOutcome, Replayer, distinct_digests};
pub use spawn::Lookahead;
pub use state::{
    Color, Deflector, DeflectorId, FailReason, GatePos, Phase, Piece, PieceId, RoundState, Slot,
};
pub use tick::Simulation;
