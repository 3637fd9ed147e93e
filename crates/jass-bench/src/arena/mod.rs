mod agents;
mod seating;

pub use agents::AgentError;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{ArenaConfig, ResolvedOutputs};
use agents::AgentBlueprint;
use jass_bot::policy::{DecisionError, Policy, PolicyContext};
use jass_core::model::deck::Deck;
use jass_core::model::player::{PlayerPosition, Team};
use jass_core::model::round::{GamePhase, GameState};
use jass_core::model::trump::Trump;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use seating::SeatRotations;

const SEAT_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Plays seeded Schieber games between four configured agents.
pub struct ArenaRunner {
    config: ArenaConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    rotations: SeatRotations,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rotations: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl ArenaRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: ArenaConfig, outputs: ResolvedOutputs) -> Result<Self, ArenaError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if agents.len() != 4 {
            return Err(ArenaError::SeatCount {
                found: agents.len(),
            });
        }

        let rotations = SeatRotations::new(config.games.rotations());

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
            rotations,
        })
    }

    /// Play every scheduled game, streaming JSONL rows to disk, then write the
    /// Markdown summary.
    pub fn run(&self) -> Result<RunSummary, ArenaError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let rotations = self.rotations.as_slice();
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for game_index in 0..self.config.games.count {
            let base_seed = rng.next_u64();

            for (rotation_index, seating) in rotations.iter().enumerate() {
                let outcome = self.play_game(game_index, rotation_index, base_seed, seating)?;
                analytics.record_game(game_index, rotation_index, &outcome)?;
                rows_written += write_game_rows(
                    &mut writer,
                    &self.config,
                    game_index,
                    rotation_index,
                    base_seed,
                    &outcome,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self.logging_enabled.then(|| {
            self.outputs
                .summary_md
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("telemetry.jsonl")
        });

        Ok(RunSummary {
            games_played: self.config.games.count,
            rotations: rotations.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    fn play_game(
        &self,
        game_index: usize,
        rotation_index: usize,
        base_seed: u64,
        seating: &[usize; 4],
    ) -> Result<GameOutcome, ArenaError> {
        let dealer = PlayerPosition::LOOP[game_index % 4];
        let mut game = GameState::deal(&Deck::shuffled_with_seed(base_seed), dealer);
        let mut seats = build_seat_states(seating, &self.agents, base_seed)?;
        let cheating = self.config.games.cheating;

        while let Some(seat) = game.to_move() {
            let state = &mut seats[seat.index()];
            match game.phase() {
                GamePhase::Declaring => {
                    let start = Instant::now();
                    let choice = with_context(&game, seat, cheating, |ctx| {
                        state.policy.choose_trump(ctx)
                    })
                    .map_err(|source| ArenaError::decision(&state.agent_name, seat, source))?;
                    let elapsed_ms = state.metrics.record(start.elapsed());

                    if self.logging_enabled && tracing::enabled!(Level::INFO) {
                        event!(
                            target: "jass_bench::declare",
                            Level::INFO,
                            run_id = %self.config.run_id,
                            game_index = game_index as u32,
                            rotation_index = rotation_index as u32,
                            seat = seat_label(seat),
                            choice = %choice,
                            elapsed_ms
                        );
                    }

                    game.declare(seat, choice).map_err(|err| {
                        ArenaError::game(format!("declaration {choice} by {seat} rejected: {err}"))
                    })?;
                }
                GamePhase::Playing => {
                    let start = Instant::now();
                    let card = with_context(&game, seat, cheating, |ctx| {
                        state.policy.choose_card(ctx)
                    })
                    .map_err(|source| ArenaError::decision(&state.agent_name, seat, source))?;
                    let elapsed_ms = state.metrics.record(start.elapsed());

                    if self.logging_enabled && tracing::enabled!(Level::INFO) {
                        event!(
                            target: "jass_bench::play",
                            Level::INFO,
                            run_id = %self.config.run_id,
                            game_index = game_index as u32,
                            rotation_index = rotation_index as u32,
                            seat = seat_label(seat),
                            card = %card,
                            elapsed_ms
                        );
                    }

                    if let Err(err) = game.play_card(seat, card) {
                        let trick = game.current_trick();
                        return Err(ArenaError::game(format!(
                            "invalid card play: {err} (seat: {seat}, card: {card}, leader: {}, cards in trick: {})",
                            trick.leader(),
                            trick.len()
                        )));
                    }
                }
                GamePhase::Finished => break,
            }
        }

        let points = game
            .final_scores()
            .ok_or_else(|| ArenaError::game("game ended before all tricks were played".into()))?;

        let seating = seats
            .iter()
            .map(|seat| SeatSnapshot {
                seat: seat_label(seat.seat).to_string(),
                bot: seat.agent_name.clone(),
            })
            .collect();

        let seat_results = seats
            .into_iter()
            .map(|seat| {
                let team = seat.seat.team();
                SeatResult {
                    agent_name: seat.agent_name,
                    seat: seat.seat,
                    team,
                    points: points[team.index()],
                    opponent_points: points[team.other().index()],
                    metrics: seat.metrics.finalize(),
                }
            })
            .collect();

        Ok(GameOutcome {
            seating,
            seat_results,
            points,
            dealer,
            declarer: game.declarer(),
            trump: game.trump(),
            pushed: game.pushed(),
            cheating,
        })
    }
}

/// Hand the policy either its own observation or, when cheating, the full deal.
fn with_context<T>(
    game: &GameState,
    seat: PlayerPosition,
    cheating: bool,
    decide: impl FnOnce(&PolicyContext<'_>) -> Result<T, DecisionError>,
) -> Result<T, DecisionError> {
    if cheating {
        decide(&PolicyContext::full(game, seat))
    } else {
        let observation = game.observation_for(seat);
        decide(&PolicyContext::observed(&observation))
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), ArenaError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

pub(crate) fn game_id(game_index: usize, rotation_index: usize) -> String {
    format!("G{game_index:05}_R{rotation_index}")
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    config: &ArenaConfig,
    game_index: usize,
    rotation_index: usize,
    base_seed: u64,
    outcome: &GameOutcome,
) -> Result<usize, ArenaError> {
    let game_id = game_id(game_index, rotation_index);

    let mut rows_written = 0usize;
    for seat_result in &outcome.seat_results {
        let row = GameLogRow {
            run_id: config.run_id.clone(),
            game_id: game_id.clone(),
            game_index,
            rotation_index,
            deal_seed: base_seed,
            seat: seat_label(seat_result.seat).to_string(),
            team: seat_result.team,
            bot: seat_result.agent_name.clone(),
            seating: outcome.seating.clone(),
            dealer: seat_label(outcome.dealer).to_string(),
            declarer: outcome.declarer.map(|seat| seat_label(seat).to_string()),
            trump: outcome.trump,
            pushed: outcome.pushed,
            cheating: outcome.cheating,
            points: seat_result.points,
            opponent_points: seat_result.opponent_points,
            differential: seat_result.differential(),
            speed_ms_turn: seat_result.metrics.avg_ms_per_decision,
            decisions: seat_result.metrics.decisions,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

fn build_seat_states(
    seating: &[usize; 4],
    agents: &[AgentBlueprint],
    base_seed: u64,
) -> Result<Vec<SeatState>, ArenaError> {
    let mut seats = Vec::with_capacity(4);
    for (seat_idx, agent_idx) in seating.iter().enumerate() {
        let seat = PlayerPosition::from_index(seat_idx).ok_or_else(|| {
            ArenaError::game(format!("invalid seat index generated: {seat_idx}"))
        })?;
        let agent = agents.get(*agent_idx).ok_or(ArenaError::InvalidSeating {
            index: seat_idx,
            agent_index: *agent_idx,
        })?;
        let seed = base_seed ^ SEAT_SEED_STRIDE.wrapping_mul(seat_idx as u64 + 1);
        seats.push(SeatState::new(seat, agent, seed));
    }
    Ok(seats)
}

pub(crate) fn seat_label(position: PlayerPosition) -> &'static str {
    match position {
        PlayerPosition::North => "north",
        PlayerPosition::East => "east",
        PlayerPosition::South => "south",
        PlayerPosition::West => "west",
    }
}

struct SeatState {
    seat: PlayerPosition,
    agent_name: String,
    policy: Box<dyn Policy>,
    metrics: DecisionMetrics,
}

impl SeatState {
    fn new(seat: PlayerPosition, agent: &AgentBlueprint, seed: u64) -> Self {
        Self {
            seat,
            agent_name: agent.name.clone(),
            policy: agent.spawn_policy(seed),
            metrics: DecisionMetrics::default(),
        }
    }
}

pub struct GameOutcome {
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    /// Final team points, North/South first.
    pub points: [u32; 2],
    pub dealer: PlayerPosition,
    pub declarer: Option<PlayerPosition>,
    pub trump: Option<Trump>,
    pub pushed: bool,
    pub cheating: bool,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: String,
    pub bot: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: PlayerPosition,
    pub team: Team,
    pub points: u32,
    pub opponent_points: u32,
    pub metrics: DecisionSummary,
}

impl SeatResult {
    pub fn differential(&self) -> i64 {
        i64::from(self.points) - i64::from(self.opponent_points)
    }
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    rotation_index: usize,
    deal_seed: u64,
    seat: String,
    team: Team,
    bot: String,
    seating: Vec<SeatSnapshot>,
    dealer: String,
    declarer: Option<String>,
    trump: Option<Trump>,
    pushed: bool,
    cheating: bool,
    points: u32,
    opponent_points: u32,
    differential: i64,
    speed_ms_turn: f64,
    decisions: u32,
}

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("agent '{agent}' at {seat} failed to decide: {source}")]
    Decision {
        agent: String,
        seat: PlayerPosition,
        #[source]
        source: DecisionError,
    },
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("configuration requires exactly 4 agents but found {found}")]
    SeatCount { found: usize },
    #[error("seat {index} references invalid agent index {agent_index}")]
    InvalidSeating { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl ArenaError {
    fn game(message: String) -> Self {
        ArenaError::Game { message }
    }

    fn decision(agent: &str, seat: PlayerPosition, source: DecisionError) -> Self {
        ArenaError::Decision {
            agent: agent.to_string(),
            seat,
            source,
        }
    }
}
