//! Inspect and play back training hands.
//!
//! Usage:
//!   cargo run --release --bin replay_hand -- [OPTIONS] [FILES]...
//!
//! Each file is a JSON starting state. Without `--play` the tool prints the
//! roster, the replay timeline and the final narrative. With `--play` it
//! runs the replay against the wall clock with a progress bar.
//!
//! Examples:
//!   replay_hand hands/*.json
//!   replay_hand --random 5 --topology 9 --seed 7 --play --speed 2

use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use preflop_replay::replay::{
    build_replay_sequence_with, ControllerOptions, ReplayController, ReplayEvent,
    ReplaySequence, ReplayTiming, VirtualClock, EMPTY_NARRATIVE,
};
use preflop_replay::table::{random_starting_state, StartingState, TableError, Topology};

#[derive(Parser, Debug)]
#[command(name = "replay_hand", about = "Inspect and play back pre-hero action")]
struct Args {
    /// Starting state JSON files.
    #[arg(required_unless_present = "random")]
    files: Vec<PathBuf>,

    /// Generate this many random hands instead of reading files.
    #[arg(long)]
    random: Option<usize>,

    /// Seed for --random.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Table size for --random (2, 6 or 9).
    #[arg(long, default_value_t = 6)]
    topology: usize,

    /// Play each hand back in real time.
    #[arg(long)]
    play: bool,

    /// Playback speed multiplier.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Use the quick preview timing.
    #[arg(long)]
    fast: bool,

    /// Print each timeline as JSON.
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load every file in parallel, keeping per-file failures.
fn load_files(files: &[PathBuf]) -> Vec<(String, Result<StartingState, TableError>)> {
    files
        .par_iter()
        .map(|path| {
            let result = StartingState::load(path).and_then(|state| {
                state.validate()?;
                Ok(state)
            });
            (path.display().to_string(), result)
        })
        .collect()
}

fn generate(count: usize, seed: u64, seats: usize) -> Result<Vec<(String, StartingState)>, TableError> {
    let topology = Topology::try_from(seats)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok((0..count)
        .map(|i| (format!("random #{}", i + 1), random_starting_state(&mut rng, topology)))
        .collect())
}

fn print_hand(name: &str, hand: &StartingState, sequence: &ReplaySequence) {
    println!(
        "\n=== {} ({}, button seat {}, hero {} at seat {}) ===",
        name,
        hand.topology,
        hand.button_seat,
        hand.hero_position,
        hand.hero_seat()
    );

    for seat in hand.players() {
        println!(
            "  Seat {}  {:<6} {:>7.1}bb{}",
            seat.seat,
            seat.position.to_string(),
            seat.stack,
            if seat.is_hero { "  (hero)" } else { "" }
        );
    }

    println!("Timeline ({}ms):", sequence.total_duration_ms);
    for step in &sequence.steps {
        println!("  +{:>5}ms  seat {}  {}", step.delay_ms, step.action.seat, step.narrative_text);
    }
    println!("Narrative: {}", sequence.final_narrative);
}

fn play(hand: &StartingState, timing: &ReplayTiming, speed: f64) {
    let clock = VirtualClock::new();
    let duration = hand
        .action_history
        .iter()
        .map(|a| timing.step_span(&a.action))
        .sum::<u64>();

    let bar = ProgressBar::new(duration.max(1));
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>5}/{len}ms {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }

    let options = ControllerOptions::new().with_timing(timing.clone());
    let mut controller =
        ReplayController::new(hand.action_history.clone(), Rc::new(clock.clone()), options);

    let observer_bar = bar.clone();
    controller.subscribe(move |event| match event {
        ReplayEvent::StepStarted(step) => observer_bar.set_position(step.delay_ms),
        ReplayEvent::NarrativeChanged(text) => observer_bar.set_message(text.clone()),
        ReplayEvent::Completed { .. } => observer_bar.set_position(duration),
        _ => {}
    });

    controller.start_replay();
    if controller.is_replaying() {
        clock.run_realtime(speed);
        bar.finish_with_message(controller.narrative());
    } else {
        bar.finish_with_message(EMPTY_NARRATIVE);
    }
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let start = Instant::now();

    let timing = if args.fast {
        ReplayTiming::fast()
    } else {
        ReplayTiming::default()
    };

    let mut failed = 0;
    let hands: Vec<(String, StartingState)> = match args.random {
        Some(count) => match generate(count, args.seed, args.topology) {
            Ok(hands) => hands,
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => load_files(&args.files)
            .into_iter()
            .filter_map(|(name, result)| match result {
                Ok(hand) => Some((name, hand)),
                Err(e) => {
                    error!(file = %name, "{}", e);
                    failed += 1;
                    None
                }
            })
            .collect(),
    };

    let sequences: Vec<ReplaySequence> = hands
        .par_iter()
        .map(|(_, hand)| build_replay_sequence_with(&hand.action_history, &timing))
        .collect();

    info!(
        hands = hands.len(),
        failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "hands loaded"
    );

    for ((name, hand), sequence) in hands.iter().zip(&sequences) {
        print_hand(name, hand, sequence);
        if args.json {
            match sequence.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => error!("failed to serialize timeline: {}", e),
            }
        }
        if args.play {
            play(hand, &timing, args.speed);
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
