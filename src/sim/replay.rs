//! Command recording and deterministic replay
//!
//! Commands are stamped with the tick they were applied on. Replaying feeds
//! each command to a fresh simulation as soon as its tick is reached, then
//! steps once, so the replayed run sees every command against exactly the
//! state the original run did.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::hash::state_digest;
use super::level::LevelDescriptor;
use super::state::{FailReason, Phase, Slot};
use super::tick::Simulation;
use crate::config::RoundConfig;

/// A committed player action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Place { row: u32, slot: Slot, tick: u64 },
    Undo { tick: u64 },
}

impl Command {
    /// Tick the command was applied on
    pub fn tick(&self) -> u64 {
        match self {
            Command::Place { tick, .. } | Command::Undo { tick } => *tick,
        }
    }
}

/// Ordered log of successful commands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandRecorder {
    commands: Vec<Command>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// JSON array of tagged command records
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.commands)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let commands: Vec<Command> = serde_json::from_str(json)?;
        Ok(Self { commands })
    }
}

/// Summary of a replayed round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayOutcome {
    pub phase: Phase,
    pub fail_reason: Option<FailReason>,
    pub banked: u32,
    pub deflectors_placed: u32,
    /// Fixed steps driven by the replayer
    pub steps: u32,
    pub digest: String,
    /// The runaway guard stopped the replay
    pub hit_ceiling: bool,
}

/// Re-drives a fresh simulation from a command list
pub struct Replayer<'a> {
    level: &'a LevelDescriptor,
    config: &'a RoundConfig,
    commands: &'a [Command],
}

impl<'a> Replayer<'a> {
    pub fn new(level: &'a LevelDescriptor, config: &'a RoundConfig, commands: &'a [Command]) -> Self {
        Self {
            level,
            config,
            commands,
        }
    }

    /// Run until the round ends or the step ceiling is reached
    ///
    /// Tutorial pauses are resumed immediately; there is nobody to read the
    /// overlay.
    pub fn run_to_completion(&self) -> ReplayOutcome {
        let mut sim = Simulation::with_config(self.level, self.config.clone());
        let mut pending = self.commands.iter().peekable();
        let mut steps = 0;

        while !sim.state().phase.is_terminal() && steps < self.config.replay_step_ceiling {
            while let Some(command) = pending.next_if(|c| sim.state().tick >= c.tick()) {
                sim.apply(command);
            }
            if sim.state().phase == Phase::TutorialPaused {
                sim.resume_from_tutorial();
            }
            sim.tick(self.config.fixed_dt);
            sim.drain_events();
            steps += 1;
        }

        let hit_ceiling = !sim.state().phase.is_terminal();
        if hit_ceiling {
            log::warn!(
                "Replay of level {} stopped at the {}-step ceiling in phase {}",
                self.level.id,
                self.config.replay_step_ceiling,
                sim.state().phase.as_str()
            );
        }

        let state = sim.state();
        ReplayOutcome {
            phase: state.phase,
            fail_reason: state.fail_reason,
            banked: state.banked_count,
            deflectors_placed: state.total_placed,
            steps,
            digest: state_digest(state),
            hit_ceiling,
        }
    }
}

/// Distinct final digests over `runs` replays of the same input
///
/// A deterministic engine always yields exactly one.
pub fn distinct_digests(
    level: &LevelDescriptor,
    config: &RoundConfig,
    commands: &[Command],
    runs: usize,
) -> BTreeSet<String> {
    let replayer = Replayer::new(level, config, commands);
    (0..runs).map(|_| replayer.run_to_completion().digest).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let mut recorder = CommandRecorder::new();
        recorder.record(Command::Place {
            row: 6,
            slot: Slot::A,
            tick: 130,
        });
        recorder.record(Command::Undo { tick: 200 });

        let json = recorder.to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"kind":"place","row":6,"slot":"a","tick":130},{"kind":"undo","tick":200}]"#
        );
        let parsed = CommandRecorder::from_json(&json).unwrap();
        assert_eq!(parsed, recorder);
        assert_eq!(parsed.commands()[1].tick(), 200);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        assert!(CommandRecorder::from_json(r#"[{"kind":"rotate","tick":1}]"#).is_err());
    }

    #[test]
    fn test_aligned_level_replays_to_win() {
        let level = LevelDescriptor::aligned(1);
        let config = RoundConfig::default();
        let outcome = Replayer::new(&level, &config, &[]).run_to_completion();

        assert_eq!(outcome.phase, Phase::Won);
        assert_eq!(outcome.banked, 24);
        assert_eq!(outcome.deflectors_placed, 0);
        assert!(!outcome.hit_ceiling);
        assert!(outcome.steps < config.replay_step_ceiling);
    }

    #[test]
    fn test_ceiling_stops_runaway() {
        let level = LevelDescriptor::aligned(1);
        let config = RoundConfig {
            replay_step_ceiling: 200,
            ..RoundConfig::default()
        };
        let outcome = Replayer::new(&level, &config, &[]).run_to_completion();
        assert!(outcome.hit_ceiling);
        assert_eq!(outcome.steps, 200);
        assert_eq!(outcome.phase, Phase::Playing);
    }

    #[test]
    fn test_hundred_runs_one_digest() {
        let level = crate::sim::level::generate_level(4, 1234, 3);
        let config = RoundConfig::default();
        let commands = [
            Command::Place {
                row: 3,
                slot: Slot::B,
                tick: 150,
            },
            Command::Undo { tick: 400 },
            Command::Place {
                row: 9,
                slot: Slot::C,
                tick: 420,
            },
        ];
        assert_eq!(distinct_digests(&level, &config, &commands, 100).len(), 1);
    }
}
