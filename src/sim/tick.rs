//! Fixed timestep round simulation
//!
//! [`Simulation`] owns a round and borrows the level it is played on.
//! Callers feed it wall-clock deltas; it runs
//! whole fixed steps and sequences the subsystems in the same order every
//! step: preview timer, movement, row interactions (checkpoint), banks,
//! spawning, win check.

use super::bank;
use super::checkpoint::{self, CheckpointManager};
use super::deflector;
use super::event::{EventQueue, RoundEvent};
use super::hash::state_digest;
use super::interaction;
use super::level::LevelDescriptor;
use super::movement;
use super::replay::{Command, CommandRecorder};
use super::scoring;
use super::spawn::{self, Lookahead};
use super::state::{Color, DeflectorId, FailReason, Phase, RoundState, Slot};
use crate::config::RoundConfig;
use crate::error::{FixError, PlacementError, UndoError};

/// A single round of play
#[derive(Debug, Clone)]
pub struct Simulation<'a> {
    level: &'a LevelDescriptor,
    config: RoundConfig,
    state: RoundState,
    /// Wall-clock time not yet consumed by a fixed step
    accumulator: f64,
    checkpoints: CheckpointManager,
    events: EventQueue,
    recorder: CommandRecorder,
    /// Phase to go back to when leaving `Paused`
    resume_phase: Option<Phase>,
}

impl<'a> Simulation<'a> {
    pub fn new(level: &'a LevelDescriptor) -> Self {
        Self::with_config(level, RoundConfig::default())
    }

    pub fn with_config(level: &'a LevelDescriptor, config: RoundConfig) -> Self {
        Self {
            level,
            config,
            state: RoundState::new(),
            accumulator: 0.0,
            checkpoints: CheckpointManager::new(),
            events: EventQueue::new(),
            recorder: CommandRecorder::new(),
            resume_phase: None,
        }
    }

    /// Advance by `dt` seconds of wall-clock time
    ///
    /// Runs as many fixed steps as the accumulated time covers and returns
    /// how many ran. Once the phase stops ticking (fail, win, tutorial hold)
    /// the rest of the batch is dropped.
    pub fn tick(&mut self, dt: f64) -> u32 {
        if !self.state.phase.is_ticking() || dt.is_nan() || dt <= 0.0 {
            return 0;
        }

        self.accumulator += dt;
        let mut steps = 0;
        while self.accumulator >= self.config.fixed_dt {
            self.accumulator -= self.config.fixed_dt;
            self.fixed_step();
            steps += 1;

            if !self.state.phase.is_ticking() {
                self.accumulator = 0.0;
                break;
            }
        }
        steps
    }

    fn fixed_step(&mut self) {
        let dt = self.config.fixed_dt;
        self.state.tick += 1;
        self.state.elapsed += dt;

        if self.state.phase == Phase::Preview {
            self.advance_preview(dt);
            return;
        }

        let delta = self.config.progress_for(dt);
        movement::advance(&mut self.state, delta);

        let interactions =
            interaction::resolve(&mut self.state, self.level, &self.config, delta, &mut self.events);
        if self.state.phase == Phase::Failed {
            self.announce_failure();
        }
        if interactions > 0 {
            self.checkpoints.save(&self.state);
        }
        if self.state.phase != Phase::Playing {
            return;
        }

        if bank::resolve(&mut self.state, &mut self.events).is_some() {
            self.announce_failure();
            return;
        }

        spawn::step(&mut self.state, self.level, &self.config, dt, &mut self.events);

        if spawn::exhausted(&self.state, self.level) && self.state.moving_count() == 0 {
            self.state.phase = Phase::Won;
            log::info!(
                "Level {} won at tick {}: {} banked, {} deflectors placed",
                self.level.id,
                self.state.tick,
                self.state.banked_count,
                self.state.total_placed
            );
            self.events.push(RoundEvent::RoundWon {
                deflectors_placed: self.state.total_placed,
                banked: self.state.banked_count,
            });
        }
    }

    fn advance_preview(&mut self, dt: f64) {
        self.state.preview_elapsed += dt;
        if self.state.preview_elapsed < self.config.total_preview_duration() {
            return;
        }

        if self.level.pauses_before_first_spawn() {
            self.state.phase = Phase::TutorialPaused;
            log::info!("Level {} holding for tutorial overlay", self.level.id);
            self.events.push(RoundEvent::TutorialPaused);
        } else {
            self.state.phase = Phase::Playing;
            log::info!("Level {} started at tick {}", self.level.id, self.state.tick);
        }
    }

    fn announce_failure(&mut self) {
        let Some(reason) = self.state.fail_reason else {
            return;
        };
        match reason {
            FailReason::Misbank { color, lane } => log::info!(
                "Level {} failed at tick {}: {} piece reached bank {}",
                self.level.id,
                self.state.tick,
                color.as_str(),
                lane
            ),
            FailReason::Overflow { lane } => log::info!(
                "Level {} failed at tick {}: lane {} overflowed",
                self.level.id,
                self.state.tick,
                lane
            ),
        }
        self.events.push(RoundEvent::RoundFailed {
            reason,
            margin: self.state.overflow_margin,
        });
    }

    // === Player commands ===

    /// Place a deflector, reporting why it was refused
    pub fn try_place(&mut self, row: u32, slot: Slot) -> Result<DeflectorId, PlacementError> {
        let id = deflector::place(&mut self.state, row, slot, &self.config)?;
        self.recorder.record(Command::Place {
            row,
            slot,
            tick: self.state.tick,
        });
        self.events.push(RoundEvent::DeflectorPlaced {
            id,
            row,
            slot,
            active: self.state.deflectors.len(),
        });
        Ok(id)
    }

    /// Place a deflector; `false` means nothing changed
    pub fn place(&mut self, row: u32, slot: Slot) -> bool {
        self.try_place(row, slot).is_ok()
    }

    /// Remove the most recently placed deflector
    pub fn try_undo(&mut self) -> Result<DeflectorId, UndoError> {
        let removed = deflector::undo(&mut self.state)?;
        self.recorder.record(Command::Undo { tick: self.state.tick });
        self.events.push(RoundEvent::DeflectorRemoved {
            id: removed.id,
            row: removed.row,
            slot: removed.slot,
        });
        Ok(removed.id)
    }

    pub fn undo(&mut self) -> bool {
        self.try_undo().is_ok()
    }

    pub fn can_place(&self, row: u32, slot: Slot) -> bool {
        deflector::can_place(&self.state, row, slot, &self.config)
    }

    /// Apply a recorded command now, ignoring its tick stamp
    pub fn apply(&mut self, command: &Command) -> bool {
        match *command {
            Command::Place { row, slot, .. } => self.place(row, slot),
            Command::Undo { .. } => self.undo(),
        }
    }

    // === Phase control ===

    /// Leave the tutorial hold and start spawning
    pub fn resume_from_tutorial(&mut self) -> bool {
        if self.state.phase != Phase::TutorialPaused {
            return false;
        }
        self.state.phase = Phase::Playing;
        log::info!("Level {} resumed after tutorial", self.level.id);
        true
    }

    pub fn pause(&mut self) -> bool {
        if !self.state.phase.is_ticking() {
            return false;
        }
        self.resume_phase = Some(self.state.phase);
        self.state.phase = Phase::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state.phase != Phase::Paused {
            return false;
        }
        self.state.phase = self.resume_phase.take().unwrap_or(Phase::Playing);
        true
    }

    /// Throw the attempt away and return to the preview
    pub fn reset(&mut self) {
        self.state = RoundState::new();
        self.accumulator = 0.0;
        self.checkpoints.clear();
        self.events.clear();
        self.recorder.clear();
        self.resume_phase = None;
        log::info!("Level {} reset", self.level.id);
    }

    // === Checkpoints ===

    /// Replace the live state, e.g. with a corrected checkpoint copy
    pub fn restore_state(&mut self, state: RoundState) {
        self.state = state;
        self.accumulator = 0.0;
        self.resume_phase = None;
    }

    /// Fix the cause of the current failure on the latest checkpoint and resume
    pub fn apply_fix(&mut self) -> Result<(), FixError> {
        let reason = match (self.state.phase, self.state.fail_reason) {
            (Phase::Failed, Some(reason)) => reason,
            (phase, _) => return Err(FixError::NotFailed(phase)),
        };
        let mut fixed = self.checkpoints.restore().ok_or(FixError::NoCheckpoint)?;

        match reason {
            FailReason::Overflow { lane } => checkpoint::apply_overflow_fix(&mut fixed, lane),
            FailReason::Misbank { .. } => checkpoint::apply_misbank_fix(&mut fixed),
        }
        log::info!(
            "Level {} fixed after {:?}, resuming from tick {}",
            self.level.id,
            reason,
            fixed.tick
        );
        self.restore_state(fixed);
        Ok(())
    }

    pub fn checkpoint(&self) -> Option<&RoundState> {
        self.checkpoints.latest()
    }

    // === Observers ===

    /// Colors of the next `count` pieces
    pub fn spawn_preview(&self, count: usize) -> Vec<Color> {
        spawn::preview(&self.state, self.level, count)
    }

    /// Colors for the "next" strip at the configured length
    pub fn upcoming(&self) -> Vec<Color> {
        self.spawn_preview(self.config.spawn_preview_count)
    }

    pub fn lookahead(&self) -> Lookahead<'a> {
        Lookahead::new(&self.state, self.level)
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        self.events.drain()
    }

    /// Stars for a won round
    pub fn stars(&self) -> Option<u8> {
        (self.state.phase == Phase::Won).then(|| scoring::stars(self.state.total_placed, self.level))
    }

    pub fn digest(&self) -> String {
        state_digest(&self.state)
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn level(&self) -> &'a LevelDescriptor {
        self.level
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn recorder(&self) -> &CommandRecorder {
        &self.recorder
    }
}
