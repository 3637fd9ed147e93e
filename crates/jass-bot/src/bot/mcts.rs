//! Root-level determinized Monte-Carlo tree search.
//!
//! The tree is a single ply: one statistics row per legal card of the seat to
//! move. Every iteration draws a fresh world, picks a card by UCB1, plays it and
//! finishes the game with a uniform rollout. Deeper structure is only seen
//! through the rollouts.

use crate::bot::params::SearchParams;
use crate::bot::rollout::{RewardScale, RolloutEvaluator};
use jass_core::belief::{Determinizer, SamplingError};
use jass_core::model::card::Card;
use jass_core::model::hand::Hand;
use jass_core::model::observation::Observation;
use jass_core::model::player::{PlayerPosition, Team};
use jass_core::model::round::{GameState, PlayError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use tracing::{Level, event};

/// What the searcher is allowed to see.
#[derive(Debug, Clone, Copy)]
pub enum WorldSource<'a> {
    /// Fair play: hidden hands are re-sampled every iteration.
    Observed(&'a Observation),
    /// Cheating mode: the real world is cloned every iteration.
    Known(&'a GameState),
}

impl WorldSource<'_> {
    pub fn seat(&self) -> Option<PlayerPosition> {
        match self {
            WorldSource::Observed(observation) => Some(observation.seat),
            WorldSource::Known(world) => world.to_move(),
        }
    }

    pub fn legal_cards(&self) -> Hand {
        match self {
            WorldSource::Observed(observation) => observation.legal_cards(),
            WorldSource::Known(world) => world.legal_cards(),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GameState, SamplingError> {
        match self {
            WorldSource::Observed(observation) => Determinizer::sample(observation, rng),
            WorldSource::Known(world) => Ok((*world).clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardStats {
    pub card: Card,
    pub visits: usize,
    pub total_reward: f64,
}

impl CardStats {
    pub fn mean(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward / self.visits as f64
        }
    }
}

/// Per-decision statistics, one row per candidate card in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsTable {
    entries: Vec<CardStats>,
    total_visits: usize,
}

impl StatsTable {
    pub fn new(candidates: Hand) -> Self {
        Self {
            entries: candidates
                .iter()
                .map(|card| CardStats {
                    card,
                    visits: 0,
                    total_reward: 0.0,
                })
                .collect(),
            total_visits: 0,
        }
    }

    pub fn entries(&self) -> &[CardStats] {
        &self.entries
    }

    pub fn total_visits(&self) -> usize {
        self.total_visits
    }

    pub fn get(&self, card: Card) -> Option<&CardStats> {
        self.entries.iter().find(|entry| entry.card == card)
    }

    pub fn record(&mut self, card: Card, reward: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|entry| entry.card == card) {
            entry.visits += 1;
            entry.total_reward += reward;
            self.total_visits += 1;
        }
    }

    /// UCB1 score; unvisited cards are always tried first.
    pub fn ucb_score(&self, entry: &CardStats, exploration: f64) -> f64 {
        if entry.visits == 0 {
            return f64::INFINITY;
        }
        let visits = entry.visits as f64;
        let total = self.total_visits.max(1) as f64;
        entry.mean() + exploration * (total.ln() / visits).sqrt()
    }

    pub fn select(&self, exploration: f64) -> Option<Card> {
        self.first_max_by(|entry| self.ucb_score(entry, exploration))
    }

    pub fn most_visited(&self) -> Option<Card> {
        self.first_max_by(|entry| entry.visits as f64)
    }

    pub fn best_mean(&self) -> Option<Card> {
        self.first_max_by(CardStats::mean)
    }

    /// Adds another table over the same candidates, row by row.
    pub fn merge(&mut self, other: &StatsTable) {
        for theirs in &other.entries {
            if let Some(ours) = self.entries.iter_mut().find(|entry| entry.card == theirs.card) {
                ours.visits += theirs.visits;
                ours.total_reward += theirs.total_reward;
                self.total_visits += theirs.visits;
            }
        }
    }

    fn first_max_by<F: Fn(&CardStats) -> f64>(&self, score: F) -> Option<Card> {
        let mut best: Option<(Card, f64)> = None;
        for entry in &self.entries {
            let value = score(entry);
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((entry.card, value)),
            }
        }
        best.map(|(card, _)| card)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MctsDecision {
    pub card: Card,
    /// Zero when the move was forced.
    pub iterations: usize,
    pub stats: StatsTable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    NotToMove,
    NoLegalCards { seat: PlayerPosition },
    Sampling(SamplingError),
    Play(PlayError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NotToMove => write!(f, "no seat is to move"),
            SearchError::NoLegalCards { seat } => write!(f, "{seat} has no legal card to search"),
            SearchError::Sampling(err) => write!(f, "determinization failed: {err}"),
            SearchError::Play(err) => write!(f, "sampled world rejected a candidate: {err}"),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<SamplingError> for SearchError {
    fn from(err: SamplingError) -> Self {
        SearchError::Sampling(err)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MctsDriver {
    iterations: usize,
    exploration: f64,
    evaluator: RolloutEvaluator,
}

impl MctsDriver {
    pub const fn new(iterations: usize, exploration: f64, scale: RewardScale) -> Self {
        Self {
            iterations,
            exploration,
            evaluator: RolloutEvaluator::new(scale),
        }
    }

    pub fn from_params(params: &SearchParams) -> Self {
        Self::new(params.iterations, params.exploration, params.reward)
    }

    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    pub const fn exploration(&self) -> f64 {
        self.exploration
    }

    pub fn decide<R: Rng + ?Sized>(
        &self,
        source: &WorldSource<'_>,
        rng: &mut R,
    ) -> Result<MctsDecision, SearchError> {
        let (seat, legal) = Self::root(source)?;
        let mut stats = StatsTable::new(legal);
        if legal.len() == 1 {
            return Self::forced(legal, stats);
        }

        self.run(source, seat.team(), &mut stats, self.iterations, rng)?;
        self.finish(seat, stats, 1)
    }

    /// Splits the iteration budget over `workers` independent shards and merges their tables.
    ///
    /// Each shard owns an `StdRng` seeded from `rng`, so the result only depends
    /// on the caller's generator and the worker count.
    pub fn decide_sharded<R: Rng + ?Sized>(
        &self,
        source: &WorldSource<'_>,
        workers: usize,
        rng: &mut R,
    ) -> Result<MctsDecision, SearchError> {
        if workers <= 1 {
            return self.decide(source, rng);
        }
        let (seat, legal) = Self::root(source)?;
        let mut stats = StatsTable::new(legal);
        if legal.len() == 1 {
            return Self::forced(legal, stats);
        }

        let team = seat.team();
        let base = self.iterations / workers;
        let extra = self.iterations % workers;
        let shards: Vec<(usize, u64)> = (0..workers)
            .map(|index| (base + usize::from(index < extra), rng.r#gen::<u64>()))
            .collect();

        let tables = shards
            .into_par_iter()
            .map(|(budget, seed)| {
                let mut shard_rng = StdRng::seed_from_u64(seed);
                let mut table = StatsTable::new(legal);
                self.run(source, team, &mut table, budget, &mut shard_rng)?;
                Ok(table)
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        for table in &tables {
            stats.merge(table);
        }
        self.finish(seat, stats, workers)
    }

    fn root(source: &WorldSource<'_>) -> Result<(PlayerPosition, Hand), SearchError> {
        let seat = source.seat().ok_or(SearchError::NotToMove)?;
        let legal = source.legal_cards();
        if legal.is_empty() {
            return Err(SearchError::NoLegalCards { seat });
        }
        Ok((seat, legal))
    }

    fn forced(legal: Hand, stats: StatsTable) -> Result<MctsDecision, SearchError> {
        let card = legal.first().ok_or(SearchError::NotToMove)?;
        Ok(MctsDecision {
            card,
            iterations: 0,
            stats,
        })
    }

    fn run<R: Rng + ?Sized>(
        &self,
        source: &WorldSource<'_>,
        team: Team,
        stats: &mut StatsTable,
        iterations: usize,
        rng: &mut R,
    ) -> Result<(), SearchError> {
        for _ in 0..iterations {
            let world = source.sample(rng)?;
            let Some(card) = stats.select(self.exploration) else {
                break;
            };
            let next = world.apply_card(card).map_err(SearchError::Play)?;
            let reward = self.evaluator.evaluate(next, team, rng);
            stats.record(card, reward);
        }
        Ok(())
    }

    fn finish(
        &self,
        seat: PlayerPosition,
        stats: StatsTable,
        workers: usize,
    ) -> Result<MctsDecision, SearchError> {
        let card = stats
            .most_visited()
            .ok_or(SearchError::NoLegalCards { seat })?;
        log_search(seat, &stats, card, workers);
        Ok(MctsDecision {
            card,
            iterations: stats.total_visits(),
            stats,
        })
    }
}

fn log_search(seat: PlayerPosition, stats: &StatsTable, chosen: Card, workers: usize) {
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }

    let summary = stats
        .entries()
        .iter()
        .map(|entry| format!("{}:{}:{:.1}", entry.card, entry.visits, entry.mean()))
        .collect::<Vec<_>>()
        .join(",");

    event!(
        target: "jass_bot::search",
        Level::DEBUG,
        seat = %seat,
        iterations = stats.total_visits(),
        workers,
        candidates = stats.entries().len(),
        stats = %summary,
        chosen = %chosen
    );
}

#[cfg(test)]
mod tests {
    use super::{MctsDriver, StatsTable, WorldSource};
    use crate::bot::rollout::RewardScale;
    use jass_core::model::card::Card;
    use jass_core::model::deck::Deck;
    use jass_core::model::hand::Hand;
    use jass_core::model::player::PlayerPosition;
    use jass_core::model::round::GameState;
    use jass_core::model::trump::{Trump, TrumpChoice};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn card(label: &str) -> Card {
        label.parse().unwrap()
    }

    fn declared(seed: u64) -> GameState {
        let mut game = GameState::deal(&Deck::shuffled_with_seed(seed), PlayerPosition::West);
        game.declare(PlayerPosition::North, TrumpChoice::Declare(Trump::Hearts))
            .unwrap();
        game
    }

    #[test]
    fn unvisited_cards_are_selected_in_order() {
        let mut table = StatsTable::new(Hand::with_cards([card("D6"), card("HA"), card("S7")]));
        assert_eq!(table.select(1.4), Some(card("D6")));
        table.record(card("D6"), 100.0);
        assert_eq!(table.select(1.4), Some(card("HA")));
        table.record(card("HA"), -100.0);
        assert_eq!(table.select(1.4), Some(card("S7")));
        table.record(card("S7"), 0.0);
        assert_eq!(table.select(1.4), Some(card("D6")));
    }

    #[test]
    fn most_visited_ties_keep_first_card() {
        // rows follow card id: D9 (5) before C6 (35)
        let mut table = StatsTable::new(Hand::with_cards([card("C6"), card("D9")]));
        table.record(card("C6"), 50.0);
        table.record(card("D9"), 1.0);
        assert_eq!(table.most_visited(), Some(card("D9")));
        assert_eq!(table.best_mean(), Some(card("C6")));
        table.record(card("C6"), -10.0);
        assert_eq!(table.most_visited(), Some(card("C6")));

        let mut level = StatsTable::new(Hand::with_cards([card("C6"), card("D9")]));
        level.record(card("C6"), 3.0);
        level.record(card("D9"), 3.0);
        assert_eq!(level.best_mean(), Some(card("D9")));
    }

    #[test]
    fn merge_adds_visits_and_rewards() {
        let legal = Hand::with_cards([card("C6"), card("D9")]);
        let mut left = StatsTable::new(legal);
        let mut right = StatsTable::new(legal);
        left.record(card("C6"), 2.0);
        right.record(card("C6"), 4.0);
        right.record(card("D9"), 1.0);
        left.merge(&right);
        assert_eq!(left.total_visits(), 3);
        let merged = left.get(card("C6")).unwrap();
        assert_eq!(merged.visits, 2);
        assert!((merged.mean() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn known_world_search_conserves_visits() {
        let world = declared(21);
        let driver = MctsDriver::new(40, 1.4, RewardScale::Differential);
        let decision = driver
            .decide(&WorldSource::Known(&world), &mut StdRng::seed_from_u64(3))
            .unwrap();
        assert_eq!(decision.iterations, 40);
        assert_eq!(decision.stats.total_visits(), 40);
        assert!(world.legal_cards().contains(decision.card));
        assert!(decision.stats.entries().iter().all(|entry| entry.visits > 0));
    }

    #[test]
    fn sharded_search_conserves_visits() {
        let world = declared(22);
        let driver = MctsDriver::new(45, 1.4, RewardScale::TeamPoints);
        let observation = world.observation_for(PlayerPosition::North);
        let decision = driver
            .decide_sharded(&WorldSource::Observed(&observation), 4, &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(decision.stats.total_visits(), 45);
        assert!(world.legal_cards().contains(decision.card));
    }
}
