use super::{DecisionError, Policy, PolicyContext, log_play_decision};
use crate::bot::{FlatMonteCarlo, SearchParams, TrumpPlanner};
use jass_core::model::card::Card;
use jass_core::model::trump::TrumpChoice;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Per-card playouts, best mean team points. Meant for cheating-mode benchmarks.
pub struct FlatMonteCarloPolicy {
    flat: FlatMonteCarlo,
    rng: StdRng,
}

impl FlatMonteCarloPolicy {
    pub fn new(flat: FlatMonteCarlo, seed: u64) -> Self {
        Self {
            flat,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_params(params: &SearchParams, seed: u64) -> Self {
        Self::new(FlatMonteCarlo::from_params(params), seed)
    }
}

impl Policy for FlatMonteCarloPolicy {
    fn name(&self) -> &'static str {
        "flat_monte_carlo"
    }

    fn choose_trump(&mut self, ctx: &PolicyContext<'_>) -> Result<TrumpChoice, DecisionError> {
        ctx.require_declaring()?;
        Ok(TrumpPlanner::choose(ctx.hand(), ctx.push_allowed(), None).choice)
    }

    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<Card, DecisionError> {
        let legal = ctx.require_legal()?;
        let card = self.flat.decide(&ctx.world_source(), &mut self.rng)?;
        log_play_decision(ctx, self.name(), legal, card, "best_mean");
        Ok(card)
    }
}
