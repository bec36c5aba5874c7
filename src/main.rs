//! Lanefall headless runner
//!
//! Loads a level, replays recorded commands against it and reports how the
//! round ended. With `--runs N` the replay is repeated and every run must
//! land on the same state digest.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use lanefall::RoundConfig;
use lanefall::sim::{
    CommandRecorder, LevelDescriptor, ReplayOutcome, Replayer, distinct_digests, generate_level,
    scoring,
};

/// Replay a lanefall round without a screen
#[derive(Parser)]
#[command(name = "lanefall", version)]
struct Args {
    /// Level descriptor (JSON); defaults to the aligned template level
    #[arg(value_name = "LEVEL")]
    level: Option<PathBuf>,

    /// Recorded commands (JSON array of place/undo records)
    #[arg(short, long, value_name = "FILE")]
    commands: Option<PathBuf>,

    /// Number of replays; all of them must agree
    #[arg(short, long, default_value_t = 1)]
    runs: usize,

    /// Generate the level from this seed instead of loading one
    #[arg(short, long, conflicts_with = "level")]
    seed: Option<u64>,

    /// Most gates a generated level may have
    #[arg(long, default_value_t = 3)]
    max_gates: usize,

    /// Level id for generated and template levels
    #[arg(long, default_value_t = 1)]
    level_id: u32,

    /// Round tuning overrides (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human readable summary
    Summary,
    /// Replay outcome as JSON
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.runs == 0 {
        anyhow::bail!("--runs must be at least 1");
    }

    let level = load_level(&args)?;
    let config = match &args.config {
        Some(path) => serde_json::from_str::<RoundConfig>(&read(path)?)
            .with_context(|| format!("Invalid round config: {}", path.display()))?,
        None => RoundConfig::default(),
    };
    let commands = match &args.commands {
        Some(path) => CommandRecorder::from_json(&read(path)?)
            .with_context(|| format!("Invalid command file: {}", path.display()))?,
        None => CommandRecorder::new(),
    };

    log::info!(
        "Replaying level {} ({} pieces, {} gates) with {} commands",
        level.id,
        level.total_pieces(),
        level.gates.len(),
        commands.len()
    );

    let outcome = Replayer::new(&level, &config, commands.commands()).run_to_completion();

    if args.runs > 1 {
        let mut digests = distinct_digests(&level, &config, commands.commands(), args.runs - 1);
        digests.insert(outcome.digest.clone());
        if digests.len() != 1 {
            anyhow::bail!(
                "Replay is not deterministic: {} distinct digests over {} runs",
                digests.len(),
                args.runs
            );
        }
        log::info!("{} runs agree on digest {}", args.runs, outcome.digest);
    }

    match args.format {
        OutputFormat::Summary => print_summary(&level, &outcome, args.runs),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

fn load_level(args: &Args) -> Result<LevelDescriptor> {
    if let Some(path) = &args.level {
        return LevelDescriptor::from_json(&read(path)?)
            .with_context(|| format!("Invalid level descriptor: {}", path.display()));
    }
    Ok(match args.seed {
        Some(seed) => generate_level(args.level_id, seed, args.max_gates),
        None => LevelDescriptor::aligned(args.level_id),
    })
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_summary(level: &LevelDescriptor, outcome: &ReplayOutcome, runs: usize) {
    println!("Level:     {}", level.id);
    println!("Phase:     {}", outcome.phase.as_str());
    if let Some(reason) = outcome.fail_reason {
        println!("Reason:    {:?}", reason);
    }
    println!("Banked:    {}/{}", outcome.banked, level.total_pieces());
    println!("Placed:    {}", outcome.deflectors_placed);
    if outcome.phase == lanefall::sim::Phase::Won {
        let stars = scoring::stars(outcome.deflectors_placed, level);
        match scoring::missed_top_tier_by(outcome.deflectors_placed, level) {
            Some(over) => println!("Stars:     {} ({} over three-star par)", stars, over),
            None => println!("Stars:     {}", stars),
        }
    }
    println!("Steps:     {}{}", outcome.steps, if outcome.hit_ceiling { " (ceiling)" } else { "" });
    println!("Digest:    {}", outcome.digest);
    if runs > 1 {
        println!("Runs:      {} (deterministic)", runs);
    }
}
