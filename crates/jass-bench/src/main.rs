use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use jass_bench::arena::ArenaRunner;
use jass_bench::config::{ArenaConfig, ResolvedOutputs};
use jass_bench::logging::init_logging;
use jass_core::AppInfo;

/// Arena harness for Schieber Jass bots.
#[derive(Debug, Parser)]
#[command(
    name = "jass-bench",
    author,
    version,
    about = "Deterministic Schieber Jass arena harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/arena.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for deal generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Let every agent see all four hands.
    #[arg(long)]
    cheating: bool,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ArenaConfig::from_path(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if cli.cheating {
        config.games.cheating = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let rotations = config.games.rotations();
    let mode = if config.games.cheating { "cheating" } else { "fair" };

    println!(
        "{} {} ({} rules)",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::variant()
    );
    println!(
        "Loaded configuration '{run_id}' ({games} game{}, {rotations} seating{}, {mode} mode)",
        if games == 1 { "" } else { "s" },
        if rotations == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = ArenaRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Arena complete for '{run_id}': {} games × {} seatings → {} rows at {}",
        summary.games_played,
        summary.rotations,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
