//! Decision strategies behind one interface: pick a trump, pick a card.

mod flat;
mod heuristic;
mod mcts;
mod minimax;
mod random;

pub use flat::FlatMonteCarloPolicy;
pub use heuristic::HeuristicPolicy;
pub use mcts::MctsPolicy;
pub use minimax::MinimaxPolicy;
pub use random::RandomPolicy;

use crate::bot::{SearchError, WorldSource};
use jass_core::belief::SamplingError;
use jass_core::model::card::Card;
use jass_core::model::hand::Hand;
use jass_core::model::observation::Observation;
use jass_core::model::player::PlayerPosition;
use jass_core::model::round::GameState;
use jass_core::model::trump::{Trump, TrumpChoice};
use std::fmt;
use tracing::{Level, event};

/// What a policy gets to look at.
#[derive(Debug, Clone, Copy)]
pub enum GameView<'a> {
    Observed(&'a Observation),
    /// Cheating mode: every hand is visible.
    Full(&'a GameState),
}

/// Context provided to policies for decision-making
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub seat: PlayerPosition,
    pub view: GameView<'a>,
}

impl<'a> PolicyContext<'a> {
    pub fn observed(observation: &'a Observation) -> Self {
        Self {
            seat: observation.seat,
            view: GameView::Observed(observation),
        }
    }

    pub fn full(world: &'a GameState, seat: PlayerPosition) -> Self {
        Self {
            seat,
            view: GameView::Full(world),
        }
    }

    pub fn hand(&self) -> Hand {
        match self.view {
            GameView::Observed(observation) => observation.hand,
            GameView::Full(world) => world.hand(self.seat),
        }
    }

    pub fn trump(&self) -> Option<Trump> {
        match self.view {
            GameView::Observed(observation) => observation.trump,
            GameView::Full(world) => world.trump(),
        }
    }

    pub fn is_declaring(&self) -> bool {
        match self.view {
            GameView::Observed(observation) => {
                observation.is_declaring() && observation.to_move() == Some(self.seat)
            }
            GameView::Full(world) => world.declaring_seat() == Some(self.seat),
        }
    }

    pub fn push_allowed(&self) -> bool {
        match self.view {
            GameView::Observed(observation) => observation.push_allowed,
            GameView::Full(world) => {
                world.push_allowed() && world.declaring_seat() == Some(self.seat)
            }
        }
    }

    /// Legal cards for `seat`; empty unless it is that seat's turn to play.
    pub fn legal_cards(&self) -> Hand {
        match self.view {
            GameView::Observed(observation) => observation.legal_cards(),
            GameView::Full(world) if world.to_move() == Some(self.seat) => world.legal_cards(),
            GameView::Full(_) => Hand::new(),
        }
    }

    pub fn world_source(&self) -> WorldSource<'a> {
        match self.view {
            GameView::Observed(observation) => WorldSource::Observed(observation),
            GameView::Full(world) => WorldSource::Known(world),
        }
    }

    fn require_legal(&self) -> Result<Hand, DecisionError> {
        let legal = self.legal_cards();
        if legal.is_empty() {
            Err(DecisionError::NoLegalCards { seat: self.seat })
        } else {
            Ok(legal)
        }
    }

    fn require_declaring(&self) -> Result<(), DecisionError> {
        if self.is_declaring() {
            Ok(())
        } else {
            Err(DecisionError::NotDeclaring { seat: self.seat })
        }
    }
}

/// Unified interface for every strategy.
pub trait Policy: Send {
    fn name(&self) -> &'static str;

    fn choose_trump(&mut self, ctx: &PolicyContext<'_>) -> Result<TrumpChoice, DecisionError>;

    /// Always a member of the legal set when it succeeds.
    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<Card, DecisionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionError {
    Sampling(SamplingError),
    NoLegalCards { seat: PlayerPosition },
    NotDeclaring { seat: PlayerPosition },
    Search(SearchError),
}

impl fmt::Display for DecisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionError::Sampling(err) => write!(f, "sampling failed: {err}"),
            DecisionError::NoLegalCards { seat } => write!(f, "{seat} has no card to play"),
            DecisionError::NotDeclaring { seat } => write!(f, "{seat} is not asked for trump"),
            DecisionError::Search(err) => write!(f, "search failed: {err}"),
        }
    }
}

impl std::error::Error for DecisionError {}

impl From<SamplingError> for DecisionError {
    fn from(err: SamplingError) -> Self {
        DecisionError::Sampling(err)
    }
}

impl From<SearchError> for DecisionError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Sampling(inner) => DecisionError::Sampling(inner),
            SearchError::NoLegalCards { seat } => DecisionError::NoLegalCards { seat },
            other => DecisionError::Search(other),
        }
    }
}

fn log_play_decision(
    ctx: &PolicyContext<'_>,
    policy: &'static str,
    legal: Hand,
    chosen: Card,
    reason: &str,
) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let legal_preview = if legal.len() <= 6 {
        legal.to_string()
    } else {
        format!("{} moves", legal.len())
    };
    let cheating = matches!(ctx.view, GameView::Full(_));

    event!(
        target: "jass_bot::play",
        Level::INFO,
        seat = %ctx.seat,
        policy,
        cheating,
        trump = ?ctx.trump(),
        legal_count = legal.len(),
        legal_moves = %legal_preview,
        reason,
        chosen = %chosen
    );
}
