use super::{DecisionError, Policy, PolicyContext, log_play_decision};
use jass_core::model::card::Card;
use jass_core::model::trump::{Trump, TrumpChoice};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform baseline: random trump class, random legal card. Never pushes.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose_trump(&mut self, ctx: &PolicyContext<'_>) -> Result<TrumpChoice, DecisionError> {
        ctx.require_declaring()?;
        let trump = Trump::ALL[self.rng.gen_range(0..Trump::ALL.len())];
        Ok(TrumpChoice::Declare(trump))
    }

    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<Card, DecisionError> {
        let legal = ctx.require_legal()?;
        let pick = self.rng.gen_range(0..legal.len());
        let card = legal
            .iter()
            .nth(pick)
            .ok_or(DecisionError::NoLegalCards { seat: ctx.seat })?;
        log_play_decision(ctx, self.name(), legal, card, "uniform");
        Ok(card)
    }
}
