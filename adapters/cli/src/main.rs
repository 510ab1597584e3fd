#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs scripted Quiz Defence sessions headlessly.

mod bank;
mod driver;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use quiz_defence_core::SpeedMultiplier;

use crate::driver::AnswerPolicy;

/// Runs a scripted, headless Quiz Defence session and prints the score.
#[derive(Debug, Parser)]
#[command(name = "quiz-defence")]
struct Args {
    /// Path to the TOML question bank.
    #[arg(long)]
    bank: PathBuf,

    /// Seed for the deterministic systems and the answer policy.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Number of waves to play before stopping.
    #[arg(long, default_value_t = 15)]
    waves: u32,

    /// How the scripted player answers quiz questions.
    #[arg(long, value_enum, default_value = "random")]
    policy: AnswerPolicy,

    /// Simulation speed factor for the run.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=3))]
    speed: u32,
}

/// Entry point for the Quiz Defence command-line interface.
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let questions = bank::load(&args.bank)
        .with_context(|| format!("loading question bank {}", args.bank.display()))?;

    let speed = match args.speed {
        1 => SpeedMultiplier::Single,
        2 => SpeedMultiplier::Double,
        _ => SpeedMultiplier::Triple,
    };
    let score = driver::run(
        questions,
        driver::Config {
            seed: args.seed,
            waves: args.waves,
            policy: args.policy,
            speed,
        },
    );

    println!(
        "wave {} | gold {} | correct answers {} | towers {} | score {}",
        score.wave.get(),
        score.gold,
        score.correct_answers,
        score.towers_placed,
        score.total()
    );
    Ok(())
}
