use super::{DecisionError, Policy, PolicyContext, log_play_decision};
use crate::bot::{TrumpClassifier, TrumpPlanner, weakest_card};
use jass_core::model::card::Card;
use jass_core::model::trump::TrumpChoice;
use std::sync::Arc;

/// Table-driven trump choice and "shed the weakest card" play.
#[derive(Default)]
pub struct HeuristicPolicy {
    classifier: Option<Arc<dyn TrumpClassifier>>,
}

impl HeuristicPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(classifier: Arc<dyn TrumpClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }
}

impl Policy for HeuristicPolicy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn choose_trump(&mut self, ctx: &PolicyContext<'_>) -> Result<TrumpChoice, DecisionError> {
        ctx.require_declaring()?;
        let decision =
            TrumpPlanner::choose(ctx.hand(), ctx.push_allowed(), self.classifier.as_deref());
        Ok(decision.choice)
    }

    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<Card, DecisionError> {
        let legal = ctx.require_legal()?;
        let card = weakest_card(legal, ctx.trump())
            .ok_or(DecisionError::NoLegalCards { seat: ctx.seat })?;
        log_play_decision(ctx, self.name(), legal, card, "weakest");
        Ok(card)
    }
}
