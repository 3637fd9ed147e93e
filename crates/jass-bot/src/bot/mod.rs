//! Search and evaluation: rollouts, the trick solver, determinized MCTS and trump selection.

mod classifier;
mod flat;
mod mcts;
mod minimax;
mod params;
mod rollout;
mod trump;

pub use classifier::{ClassifierError, LayerWeights, MlpTrumpClassifier, TrumpClassifier};
pub use flat::FlatMonteCarlo;
pub use mcts::{CardStats, MctsDecision, MctsDriver, SearchError, StatsTable, WorldSource};
pub use minimax::{SolvedMove, TrickSolver};
pub use params::SearchParams;
pub use rollout::{Horizon, RewardScale, RolloutEvaluator};
pub use trump::{
    CONFIDENCE_THRESHOLD, PUSH_SCORE_THRESHOLD, TrumpDecision, TrumpPlanner, TrumpSource,
    score_hand,
};

use jass_core::model::card::Card;
use jass_core::model::hand::Hand;
use jass_core::model::trump::Trump;

/// Lowest-ranked card of `candidates`, preferring anything that is not trump.
///
/// Rank offsets grow toward the Six; ties keep the lowest card id.
pub fn weakest_card(candidates: Hand, trump: Option<Trump>) -> Option<Card> {
    let trump_color = trump.and_then(Trump::color);
    let non_trumps: Hand = candidates
        .iter()
        .filter(|card| Some(card.color()) != trump_color)
        .collect();
    let pool = if non_trumps.is_empty() {
        candidates
    } else {
        non_trumps
    };
    let mut worst: Option<Card> = None;
    for card in pool.iter() {
        match worst {
            Some(current) if card.rank().offset() <= current.rank().offset() => {}
            _ => worst = Some(card),
        }
    }
    worst
}
