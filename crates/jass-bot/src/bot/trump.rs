use crate::bot::classifier::TrumpClassifier;
use jass_core::model::hand::Hand;
use jass_core::model::trump::{Trump, TrumpChoice};
use serde::Serialize;
use tracing::{Level, event};

/// Below this heuristic score the declaring seat pushes when it may.
pub const PUSH_SCORE_THRESHOLD: i32 = 68;
/// Below this classifier confidence the declaring seat pushes when it may.
pub const CONFIDENCE_THRESHOLD: f32 = 0.30;

// Per rank offset, Ace first.
const TRUMP_SCORE: [i32; 9] = [15, 10, 7, 25, 6, 19, 5, 5, 5];
const NO_TRUMP_SCORE: [i32; 9] = [9, 7, 5, 2, 1, 0, 0, 0, 0];
const OBE_ABE_SCORE: [i32; 9] = [14, 10, 8, 7, 5, 0, 5, 0, 0];
const UNE_UFE_SCORE: [i32; 9] = [0, 2, 1, 1, 5, 5, 7, 9, 11];

const HEURISTIC_ORDER: [Trump; 6] = [
    Trump::Clubs,
    Trump::Spades,
    Trump::Hearts,
    Trump::Diamonds,
    Trump::ObeAbe,
    Trump::UneUfe,
];

pub fn score_hand(hand: Hand, trump: Trump) -> i32 {
    hand.iter()
        .map(|card| {
            let offset = card.rank().index();
            match trump {
                Trump::ObeAbe => OBE_ABE_SCORE[offset],
                Trump::UneUfe => UNE_UFE_SCORE[offset],
                _ if trump.color() == Some(card.color()) => TRUMP_SCORE[offset],
                _ => NO_TRUMP_SCORE[offset],
            }
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrumpSource {
    Classifier,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrumpDecision {
    pub choice: TrumpChoice,
    /// Best class: its table score, or its probability for classifier decisions.
    pub score: f64,
    pub source: TrumpSource,
}

pub struct TrumpPlanner;

impl TrumpPlanner {
    /// Classifier first when one is supplied, score tables otherwise. Never fails.
    pub fn choose(
        hand: Hand,
        push_allowed: bool,
        classifier: Option<&dyn TrumpClassifier>,
    ) -> TrumpDecision {
        let decision = match classifier {
            Some(model) => Self::from_classifier(hand, push_allowed, model),
            None => Self::from_scores(hand, push_allowed),
        };
        log_trump_decision(hand, push_allowed, &decision);
        decision
    }

    pub fn from_scores(hand: Hand, push_allowed: bool) -> TrumpDecision {
        let mut best = (HEURISTIC_ORDER[0], score_hand(hand, HEURISTIC_ORDER[0]));
        for trump in HEURISTIC_ORDER.into_iter().skip(1) {
            let score = score_hand(hand, trump);
            if score > best.1 {
                best = (trump, score);
            }
        }

        let (trump, score) = best;
        let choice = if push_allowed && score < PUSH_SCORE_THRESHOLD {
            TrumpChoice::Push
        } else {
            TrumpChoice::Declare(trump)
        };
        TrumpDecision {
            choice,
            score: f64::from(score),
            source: TrumpSource::Heuristic,
        }
    }

    pub fn from_classifier(
        hand: Hand,
        push_allowed: bool,
        classifier: &dyn TrumpClassifier,
    ) -> TrumpDecision {
        let probs = classifier.predict_distribution(&hand);
        let mut best = (Trump::ALL[0], probs[0]);
        for trump in Trump::ALL.into_iter().skip(1) {
            let prob = probs[trump.index()];
            if prob > best.1 {
                best = (trump, prob);
            }
        }

        let (trump, confidence) = best;
        if !confidence.is_finite() {
            return Self::from_scores(hand, push_allowed);
        }
        let choice = if push_allowed && confidence < CONFIDENCE_THRESHOLD {
            TrumpChoice::Push
        } else {
            TrumpChoice::Declare(trump)
        };
        TrumpDecision {
            choice,
            score: f64::from(confidence),
            source: TrumpSource::Classifier,
        }
    }
}

fn log_trump_decision(hand: Hand, push_allowed: bool, decision: &TrumpDecision) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    event!(
        target: "jass_bot::trump",
        Level::INFO,
        hand = %hand,
        push_allowed,
        source = ?decision.source,
        score = decision.score,
        chosen = %decision.choice
    );
}
