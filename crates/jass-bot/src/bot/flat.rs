use crate::bot::mcts::{SearchError, StatsTable, WorldSource};
use crate::bot::params::SearchParams;
use crate::bot::rollout::{RewardScale, RolloutEvaluator};
use jass_core::model::card::Card;
use rand::Rng;

/// Flat Monte-Carlo: a fixed number of rollouts behind every legal card, highest mean wins.
#[derive(Debug, Clone, Copy)]
pub struct FlatMonteCarlo {
    simulations_per_card: usize,
    evaluator: RolloutEvaluator,
}

impl FlatMonteCarlo {
    pub const fn new(simulations_per_card: usize) -> Self {
        Self {
            simulations_per_card,
            evaluator: RolloutEvaluator::new(RewardScale::TeamPoints),
        }
    }

    pub const fn with_scale(mut self, scale: RewardScale) -> Self {
        self.evaluator = RolloutEvaluator::new(scale);
        self
    }

    pub fn from_params(params: &SearchParams) -> Self {
        Self::new(params.simulations_per_card)
    }

    pub const fn simulations_per_card(&self) -> usize {
        self.simulations_per_card
    }

    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        source: &WorldSource<'_>,
        rng: &mut R,
    ) -> Result<StatsTable, SearchError> {
        let seat = source.seat().ok_or(SearchError::NotToMove)?;
        let legal = source.legal_cards();
        if legal.is_empty() {
            return Err(SearchError::NoLegalCards { seat });
        }

        let mut stats = StatsTable::new(legal);
        for card in legal.iter() {
            for _ in 0..self.simulations_per_card {
                let world = source.sample(rng)?;
                let next = world.apply_card(card).map_err(SearchError::Play)?;
                let reward = self.evaluator.evaluate(next, seat.team(), rng);
                stats.record(card, reward);
            }
        }
        Ok(stats)
    }

    pub fn decide<R: Rng + ?Sized>(
        &self,
        source: &WorldSource<'_>,
        rng: &mut R,
    ) -> Result<Card, SearchError> {
        let seat = source.seat().ok_or(SearchError::NotToMove)?;
        let legal = source.legal_cards();
        match legal.len() {
            0 => Err(SearchError::NoLegalCards { seat }),
            1 => legal.first().ok_or(SearchError::NoLegalCards { seat }),
            _ => self
                .evaluate(source, rng)?
                .best_mean()
                .ok_or(SearchError::NoLegalCards { seat }),
        }
    }
}
