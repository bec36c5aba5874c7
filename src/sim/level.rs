//! Level descriptors
//!
//! A level is parsed and validated by an external loader; the simulation
//! only borrows the result. Positions are trusted as given.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Color, GatePos};
use crate::consts::*;
use crate::error::LevelError;

/// One scheduled spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveEntry {
    pub lane: u8,
    pub color: Color,
}

impl WaveEntry {
    pub fn new(lane: u8, color: Color) -> Self {
        Self { lane, color }
    }

    /// An entry whose color already matches its lane's bank
    pub fn aligned(lane: u8) -> Self {
        Self::new(lane, Color::bank_for_lane(lane))
    }
}

fn default_cycle_every() -> u32 {
    DEFAULT_CYCLE_EVERY
}

/// What a gate does to a piece that reaches it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateKind {
    /// Jams every piece that is not `allowed`
    Color { allowed: Color },
    /// Allowed color rotates through `colors`, advancing every `every` encounters
    Cycle {
        colors: Vec<Color>,
        #[serde(default = "default_cycle_every")]
        every: u32,
    },
    /// Turns `from` pieces into `to` pieces, ignores the rest
    Repaint { from: Color, to: Color },
}

/// Discriminant of [`GateKind`], for events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateType {
    Color,
    Cycle,
    Repaint,
}

impl GateKind {
    pub fn gate_type(&self) -> GateType {
        match self {
            GateKind::Color { .. } => GateType::Color,
            GateKind::Cycle { .. } => GateType::Cycle,
            GateKind::Repaint { .. } => GateType::Repaint,
        }
    }
}

/// A level-authored effect at a fixed (lane, row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub lane: u8,
    /// 1-indexed board row
    pub row: u32,
    #[serde(flatten)]
    pub kind: GateKind,
}

impl Gate {
    pub fn color(lane: u8, row: u32, allowed: Color) -> Self {
        Self {
            lane,
            row,
            kind: GateKind::Color { allowed },
        }
    }

    pub fn cycle(lane: u8, row: u32, colors: Vec<Color>, every: u32) -> Self {
        Self {
            lane,
            row,
            kind: GateKind::Cycle { colors, every },
        }
    }

    pub fn repaint(lane: u8, row: u32, from: Color, to: Color) -> Self {
        Self {
            lane,
            row,
            kind: GateKind::Repaint { from, to },
        }
    }

    pub fn pos(&self) -> GatePos {
        GatePos {
            lane: self.lane,
            row: self.row,
        }
    }
}

/// First-time-user overlay copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialConfig {
    pub overlay_text: String,
    #[serde(default)]
    pub end_card_text: String,
    /// Hold the round before the first spawn until resumed
    #[serde(default)]
    pub pause_before_first_spawn: bool,
}

/// Everything a round needs to know about its level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub id: u32,
    /// Ordered waves of spawn entries
    pub waves: Vec<Vec<WaveEntry>>,
    #[serde(default)]
    pub gates: Vec<Gate>,
    /// Most deflectors placed that still earns three stars
    #[serde(default = "default_three_star_max")]
    pub three_star_max: u32,
    /// Most deflectors placed that still earns two stars
    #[serde(default = "default_two_star_max")]
    pub two_star_max: u32,
    #[serde(default)]
    pub tutorial: Option<TutorialConfig>,
}

fn default_three_star_max() -> u32 {
    THREE_STAR_MAX
}

fn default_two_star_max() -> u32 {
    TWO_STAR_MAX
}

impl LevelDescriptor {
    pub fn new(id: u32, waves: Vec<Vec<WaveEntry>>, gates: Vec<Gate>) -> Self {
        Self {
            id,
            waves,
            gates,
            three_star_max: THREE_STAR_MAX,
            two_star_max: TWO_STAR_MAX,
            tutorial: None,
        }
    }

    /// Template level: every wave sends one bank-matched piece per lane
    ///
    /// Used for level ids beyond authored content; wins with no deflectors.
    pub fn aligned(id: u32) -> Self {
        let wave: Vec<WaveEntry> = (0..LANE_COUNT).map(WaveEntry::aligned).collect();
        Self::new(id, vec![wave; WAVES_PER_LEVEL], Vec::new())
    }

    /// Parse the loader's JSON form
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Pieces the level will spawn in total
    pub fn total_pieces(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// Gate at (lane, row), if any
    pub fn gate_at(&self, lane: u8, row: u32) -> Option<&Gate> {
        self.gates.iter().find(|g| g.lane == lane && g.row == row)
    }

    /// Whether the round holds for the tutorial overlay before spawning
    pub fn pauses_before_first_spawn(&self) -> bool {
        self.tutorial
            .as_ref()
            .is_some_and(|t| t.pause_before_first_spawn)
    }

    pub fn with_tutorial(mut self, tutorial: TutorialConfig) -> Self {
        self.tutorial = Some(tutorial);
        self
    }

    pub fn with_star_thresholds(mut self, three_star_max: u32, two_star_max: u32) -> Self {
        self.three_star_max = three_star_max;
        self.two_star_max = two_star_max;
        self
    }
}

/// Generate a level from a seed
///
/// Deterministic for a given `(id, seed)`: same waves, same gates. Roughly
/// one entry in five starts off its home lane, and up to `max_gates` gates
/// are scattered over rows 2..=11 with at most one gate per position.
pub fn generate_level(id: u32, seed: u64, max_gates: usize) -> LevelDescriptor {
    // Mix the level id into the seed so neighbouring levels differ
    let level_seed = (id as u64).wrapping_mul(2654435761).wrapping_add(seed);
    let mut rng = Pcg32::seed_from_u64(level_seed);

    let mut waves = Vec::with_capacity(WAVES_PER_LEVEL);
    for _ in 0..WAVES_PER_LEVEL {
        let mut wave = Vec::with_capacity(WAVE_SIZE);
        for _ in 0..WAVE_SIZE {
            let lane = rng.random_range(0..LANE_COUNT);
            let color = if rng.random_bool(0.2) {
                Color::ALL[rng.random_range(0..Color::ALL.len())]
            } else {
                Color::bank_for_lane(lane)
            };
            wave.push(WaveEntry::new(lane, color));
        }
        waves.push(wave);
    }

    let gate_count = if max_gates == 0 {
        0
    } else {
        rng.random_range(0..=max_gates)
    };
    let mut gates: Vec<Gate> = Vec::with_capacity(gate_count);
    // Bounded so a crowded board cannot spin forever
    let mut attempts = 0;
    while gates.len() < gate_count && attempts < gate_count * 8 {
        attempts += 1;
        let lane = rng.random_range(0..LANE_COUNT);
        let row = rng.random_range(2..ROW_COUNT);
        if gates.iter().any(|g| g.lane == lane && g.row == row) {
            continue;
        }
        let home = Color::bank_for_lane(lane);
        let gate = match rng.random_range(0..3) {
            0 => Gate::color(lane, row, home),
            1 => {
                let other = Color::ALL[rng.random_range(0..Color::ALL.len())];
                Gate::cycle(lane, row, vec![home, other], DEFAULT_CYCLE_EVERY)
            }
            _ => {
                let from = Color::ALL[rng.random_range(0..Color::ALL.len())];
                Gate::repaint(lane, row, from, home)
            }
        };
        gates.push(gate);
    }

    log::debug!(
        "Generated level {} (seed {}): {} pieces, {} gates",
        id,
        seed,
        WAVES_PER_LEVEL * WAVE_SIZE,
        gates.len()
    );

    LevelDescriptor::new(id, waves, gates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_level_shape() {
        let level = LevelDescriptor::aligned(7);
        assert_eq!(level.waves.len(), 6);
        assert_eq!(level.total_pieces(), 24);
        assert!(level.gates.is_empty());
        for wave in &level.waves {
            for entry in wave {
                assert_eq!(entry.color, Color::bank_for_lane(entry.lane));
            }
        }
    }

    #[test]
    fn test_parse_tagged_gates() {
        let json = r#"{
            "id": 12,
            "waves": [[{"lane": 1, "color": "red"}]],
            "gates": [
                {"type": "color", "lane": 1, "row": 6, "allowed": "green"},
                {"type": "cycle", "lane": 2, "row": 4, "colors": ["yellow", "blue"]},
                {"type": "repaint", "lane": 0, "row": 3, "from": "blue", "to": "red"}
            ],
            "tutorial": {"overlay_text": "Tap a boundary", "pause_before_first_spawn": true}
        }"#;
        let level = LevelDescriptor::from_json(json).unwrap();
        assert_eq!(level.gates.len(), 3);
        assert_eq!(level.gate_at(1, 6).unwrap().kind, GateKind::Color { allowed: Color::Green });
        assert_eq!(
            level.gate_at(2, 4).unwrap().kind,
            GateKind::Cycle {
                colors: vec![Color::Yellow, Color::Blue],
                every: DEFAULT_CYCLE_EVERY
            }
        );
        assert!(level.gate_at(3, 3).is_none());
        assert!(level.pauses_before_first_spawn());
        assert_eq!(level.three_star_max, THREE_STAR_MAX);
    }

    #[test]
    fn test_json_round_trip_preserves_gates() {
        let level = generate_level(3, 42, 4);
        let back = LevelDescriptor::from_json(&level.to_json().unwrap()).unwrap();
        assert_eq!(back, level);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = LevelDescriptor::from_json(r#"{"id": 1, "waves": [[{"lane": 0, "color": "pink"}]]}"#);
        assert!(matches!(err, Err(LevelError::Parse(_))));
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(generate_level(5, 99, 3), generate_level(5, 99, 3));
        assert_ne!(generate_level(5, 99, 3).waves, generate_level(6, 99, 3).waves);
    }

    #[test]
    fn test_generated_gates_are_unique_and_in_range() {
        for seed in 0..50 {
            let level = generate_level(1, seed, 6);
            assert_eq!(level.total_pieces(), 24);
            for (i, gate) in level.gates.iter().enumerate() {
                assert!(gate.lane < LANE_COUNT);
                assert!((2..ROW_COUNT).contains(&gate.row));
                assert!(level.gates[..i].iter().all(|g| g.pos() != gate.pos()));
            }
        }
    }
}
