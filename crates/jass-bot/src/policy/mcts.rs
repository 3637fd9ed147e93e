use super::{DecisionError, Policy, PolicyContext, log_play_decision};
use crate::bot::{MctsDriver, SearchParams, TrumpClassifier, TrumpPlanner};
use jass_core::model::card::Card;
use jass_core::model::trump::TrumpChoice;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Determinized root-level MCTS for cards; classifier or score tables for trump.
pub struct MctsPolicy {
    driver: MctsDriver,
    workers: usize,
    classifier: Option<Arc<dyn TrumpClassifier>>,
    rng: StdRng,
}

impl MctsPolicy {
    pub fn new(driver: MctsDriver, seed: u64) -> Self {
        Self {
            driver,
            workers: 1,
            classifier: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_params(params: &SearchParams, seed: u64) -> Self {
        Self::new(MctsDriver::from_params(params), seed).with_workers(params.workers)
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn TrumpClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn driver(&self) -> &MctsDriver {
        &self.driver
    }
}

impl Policy for MctsPolicy {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn choose_trump(&mut self, ctx: &PolicyContext<'_>) -> Result<TrumpChoice, DecisionError> {
        ctx.require_declaring()?;
        let decision =
            TrumpPlanner::choose(ctx.hand(), ctx.push_allowed(), self.classifier.as_deref());
        Ok(decision.choice)
    }

    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<Card, DecisionError> {
        let legal = ctx.require_legal()?;
        let source = ctx.world_source();
        let decision = if self.workers > 1 {
            self.driver
                .decide_sharded(&source, self.workers, &mut self.rng)?
        } else {
            self.driver.decide(&source, &mut self.rng)?
        };
        let reason = if decision.iterations == 0 {
            "forced"
        } else {
            "most_visited"
        };
        log_play_decision(ctx, self.name(), legal, decision.card, reason);
        Ok(decision.card)
    }
}
