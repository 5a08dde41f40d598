//! Typing Dodge headless runner
//!
//! Plays one round with the autopilot typing at the assumed throughput and
//! prints the result as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use typing_dodge::sim::autopilot;
use typing_dodge::sim::{DifficultyState, RoundStats};
use typing_dodge::words::{CachedWords, RandomWords, WordList, WordSource};
use typing_dodge::{GameConfig, GameState, InputEvent, RoundResult, RoundStatus, StagePreset, tick};

#[derive(Parser, Debug)]
#[command(name = "typing-dodge")]
#[command(about = "Headless falling-block typing dodge simulation")]
struct Cli {
    /// JSON config file (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting stage, 1-6
    #[arg(long, default_value_t = 1)]
    stage: u32,

    /// Word list (JSON array or whitespace separated text)
    #[arg(long)]
    words: Option<PathBuf>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Frame rate of the simulated host
    #[arg(long, default_value_t = 60)]
    fps: u64,

    /// Stop after this many seconds even if still alive
    #[arg(long, default_value_t = 600)]
    max_seconds: u64,
}

#[derive(Serialize)]
struct Summary {
    stage: &'static str,
    result: Option<RoundResult>,
    elapsed_ms: u64,
    difficulty: DifficultyState,
    stats: RoundStats,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let Some(preset) = StagePreset::from_number(cli.stage) else {
        bail!("stage must be 1-6, got {}", cli.stage);
    };
    if cli.fps == 0 {
        bail!("fps must be positive");
    }

    let fallback = RandomWords::new(&config.charset, config.seed);
    let source: Box<dyn WordSource> = match &cli.words {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading word list {}", path.display()))?;
            let list = if path.extension().is_some_and(|e| e == "json") {
                WordList::from_json(&text, config.seed)
                    .with_context(|| format!("parsing word list {}", path.display()))?
            } else {
                WordList::from_text(&text, config.seed)
            };
            log::info!("Loaded {} words from {}", list.len(), path.display());
            Box::new(CachedWords::new(list, 64, fallback))
        }
        None => Box::new(fallback),
    };

    log::info!("Typing Dodge (headless) starting: {}", preset.as_str());
    let mut state = GameState::with_word_source(config, preset.config(), source);
    run(&mut state, &cli);

    let result = match state.status() {
        RoundStatus::Over(result) => Some(result),
        RoundStatus::Ongoing => None,
    };
    let summary = Summary {
        stage: preset.as_str(),
        result,
        elapsed_ms: state.elapsed_ms(),
        difficulty: *state.difficulty(),
        stats: *state.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Drive the round frame by frame until it ends or the time cap is hit
fn run(state: &mut GameState, cli: &Cli) {
    let frame_ms = (1000 / cli.fps).max(1);
    let commit_gap_ms = (1000.0 / state.config().assumed_moves_per_second).ceil() as u64;
    let limit_ms = cli.max_seconds * 1000;
    let mut next_commit_ms = 0;
    let mut next_report_ms = 10_000;

    while !state.is_over() && state.elapsed_ms() < limit_ms {
        // Bulk refills happen between frames, never inside a commit
        if state.word_source_mut().needs_refill() {
            state.word_source_mut().refill();
        }

        if state.elapsed_ms() >= next_commit_ms {
            if let Some(word) = autopilot::suggest_commit(state) {
                for ch in word.chars() {
                    state.handle_input(InputEvent::Char(ch));
                }
                state.handle_input(InputEvent::Commit);
                next_commit_ms = state.elapsed_ms() + commit_gap_ms;
            }
        }

        tick(state, frame_ms);

        if state.elapsed_ms() >= next_report_ms {
            log::info!(
                "{}s: col {}, speed {:.2} rows/s, {} falling, {} spawned, {} deferred",
                state.elapsed_ms() / 1000,
                state.player_col(),
                state.effective_steps_per_second(),
                state.obstacles().len(),
                state.stats().spawned,
                state.stats().deferred
            );
            next_report_ms += 10_000;
        }
    }
}
