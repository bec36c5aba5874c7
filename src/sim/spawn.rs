//! Wave spawning
//!
//! Pieces leave the spawn row one at a time: the first as soon as play
//! begins, the rest of a wave `inter_piece_spacing` apart, and a breathing
//! window separates consecutive waves.

use super::event::{EventQueue, RoundEvent};
use super::level::{LevelDescriptor, WaveEntry};
use super::state::{Color, Phase, Piece, PieceId, RoundState};
use crate::config::RoundConfig;

/// Next entry that is due to spawn this step, if any
pub fn due_entry(state: &RoundState, level: &LevelDescriptor, config: &RoundConfig) -> Option<WaveEntry> {
    if state.phase != Phase::Playing || state.breathing {
        return None;
    }
    let wave = level.waves.get(state.wave_index)?;
    let entry = *wave.get(state.spawned_in_wave)?;

    let first_of_round = state.wave_index == 0 && state.spawned_in_wave == 0;
    if first_of_round || state.since_last_spawn >= config.inter_piece_spacing {
        Some(entry)
    } else {
        None
    }
}

/// Advance spawn timers by one fixed step and spawn at most one piece
pub fn step(
    state: &mut RoundState,
    level: &LevelDescriptor,
    config: &RoundConfig,
    dt: f64,
    events: &mut EventQueue,
) -> Option<PieceId> {
    state.since_last_spawn += dt;

    if state.breathing {
        state.breath_elapsed += dt;
        if state.breath_elapsed < config.breath_duration {
            return None;
        }
        state.breathing = false;
        state.breath_elapsed = 0.0;
    }

    let entry = due_entry(state, level, config)?;

    let id = state.spawned_count;
    state.pieces.push(Piece::new(id, entry.color, entry.lane));
    state.spawned_count += 1;
    state.spawned_in_wave += 1;
    state.since_last_spawn = 0.0;

    log::debug!(
        "Spawned piece {} ({}) in lane {} [wave {}]",
        id,
        entry.color.as_str(),
        entry.lane,
        state.wave_index
    );
    events.push(RoundEvent::PieceSpawned {
        id,
        color: entry.color,
        lane: entry.lane,
    });

    let wave_len = level.waves.get(state.wave_index).map_or(0, Vec::len);
    if state.spawned_in_wave >= wave_len {
        state.wave_index += 1;
        state.spawned_in_wave = 0;
        if state.wave_index < level.waves.len() {
            state.breathing = true;
            state.breath_elapsed = 0.0;
        }
    }

    Some(id)
}

/// Whether every scheduled piece has been produced
pub fn exhausted(state: &RoundState, level: &LevelDescriptor) -> bool {
    state.spawned_count as usize >= level.total_pieces()
}

/// Colors of the pieces still to come, in spawn order
///
/// Borrows the level and a (wave, entry) cursor; cloning the iterator
/// restarts from the same point, and the state is never touched.
#[derive(Debug, Clone)]
pub struct Lookahead<'a> {
    level: &'a LevelDescriptor,
    wave: usize,
    entry: usize,
}

impl<'a> Lookahead<'a> {
    pub fn new(state: &RoundState, level: &'a LevelDescriptor) -> Self {
        Self {
            level,
            wave: state.wave_index,
            entry: state.spawned_in_wave,
        }
    }
}

impl Iterator for Lookahead<'_> {
    type Item = Color;

    fn next(&mut self) -> Option<Color> {
        loop {
            let wave = self.level.waves.get(self.wave)?;
            if let Some(entry) = wave.get(self.entry) {
                self.entry += 1;
                return Some(entry.color);
            }
            self.wave += 1;
            self.entry = 0;
        }
    }
}

/// The next `count` colors for the "next" strip
pub fn preview(state: &RoundState, level: &LevelDescriptor, count: usize) -> Vec<Color> {
    Lookahead::new(state, level).take(count).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn playing_state() -> RoundState {
        let mut state = RoundState::new();
        state.phase = Phase::Playing;
        state
    }

    /// Run spawn steps until a piece appears, returning steps taken
    fn steps_until_spawn(
        state: &mut RoundState,
        level: &LevelDescriptor,
        config: &RoundConfig,
        events: &mut EventQueue,
    ) -> usize {
        for n in 1..=1000 {
            if step(state, level, config, SIM_DT, events).is_some() {
                return n;
            }
        }
        panic!("no spawn within 1000 steps");
    }

    #[test]
    fn test_first_spawn_is_immediate() {
        let level = LevelDescriptor::aligned(1);
        let config = RoundConfig::default();
        let mut state = playing_state();
        let mut events = EventQueue::new();

        assert_eq!(step(&mut state, &level, &config, SIM_DT, &mut events), Some(0));
        assert_eq!(state.pieces.len(), 1);
        assert_eq!(state.pieces[0].lane, 0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_no_spawn_outside_playing() {
        let level = LevelDescriptor::aligned(1);
        let config = RoundConfig::default();
        let mut state = RoundState::new();
        let mut events = EventQueue::new();

        assert_eq!(step(&mut state, &level, &config, SIM_DT, &mut events), None);
        state.phase = Phase::Failed;
        assert_eq!(step(&mut state, &level, &config, SIM_DT, &mut events), None);
        assert!(state.pieces.is_empty());
    }

    #[test]
    fn test_spacing_then_breath() {
        let level = LevelDescriptor::aligned(1);
        let config = RoundConfig::default();
        let mut state = playing_state();
        let mut events = EventQueue::new();

        step(&mut state, &level, &config, SIM_DT, &mut events);
        // Inside a wave: ~0.6 s apart (36 steps, allow float slack)
        for _ in 0..3 {
            let gap = steps_until_spawn(&mut state, &level, &config, &mut events);
            assert!((36..=37).contains(&gap), "gap was {gap}");
        }
        assert_eq!(state.wave_index, 1);
        assert!(state.breathing);

        // Between waves: the 1.2 s breath
        let gap = steps_until_spawn(&mut state, &level, &config, &mut events);
        assert!((72..=73).contains(&gap), "gap was {gap}");
        assert_eq!(state.spawned_in_wave, 1);
    }

    #[test]
    fn test_no_breath_after_final_wave() {
        let level = LevelDescriptor::new(1, vec![vec![WaveEntry::aligned(0)]], Vec::new());
        let config = RoundConfig::default();
        let mut state = playing_state();
        let mut events = EventQueue::new();

        step(&mut state, &level, &config, SIM_DT, &mut events);
        assert_eq!(state.wave_index, 1);
        assert!(!state.breathing);
        assert!(exhausted(&state, &level));
        for _ in 0..200 {
            assert_eq!(step(&mut state, &level, &config, SIM_DT, &mut events), None);
        }
    }

    #[test]
    fn test_preview_is_restartable_and_pure() {
        let level = LevelDescriptor::new(
            1,
            vec![
                vec![WaveEntry::new(0, Color::Blue), WaveEntry::new(1, Color::Red)],
                vec![WaveEntry::new(2, Color::Green)],
            ],
            Vec::new(),
        );
        let mut state = playing_state();
        state.spawned_in_wave = 1;
        let before = state.clone();

        let look = Lookahead::new(&state, &level);
        let again = look.clone();
        assert_eq!(look.collect::<Vec<_>>(), vec![Color::Red, Color::Green]);
        assert_eq!(again.collect::<Vec<_>>(), vec![Color::Red, Color::Green]);
        assert_eq!(preview(&state, &level, 8), vec![Color::Red, Color::Green]);
        assert_eq!(preview(&state, &level, 1), vec![Color::Red]);
        assert_eq!(state, before);
    }
}
