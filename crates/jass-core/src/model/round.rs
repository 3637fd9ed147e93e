use crate::model::card::Card;
use crate::model::deck::{Deck, HAND_SIZE};
use crate::model::hand::Hand;
use crate::model::observation::Observation;
use crate::model::player::PlayerPosition;
use crate::model::score::ScoreBoard;
use crate::model::trick::{Trick, TrickError, TrickRecord};
use crate::model::trump::{Trump, TrumpChoice};
use crate::rules;
use std::fmt;

pub const TRICKS_PER_GAME: usize = HAND_SIZE;

/// Fully specified game: every hand is known.
///
/// Search code treats a `GameState` as an owned world: it is cloned before
/// being advanced and is never shared between branches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    hands: [Hand; 4],
    dealer: PlayerPosition,
    forehand: PlayerPosition,
    declarer: Option<PlayerPosition>,
    trump: Option<Trump>,
    pushed: bool,
    current_trick: Trick,
    trick_history: Vec<TrickRecord>,
    scores: ScoreBoard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Declaring,
    Playing,
    Finished,
}

impl GameState {
    /// Deals `deck` in blocks of nine; the seat after the dealer is forehand.
    pub fn deal(deck: &Deck, dealer: PlayerPosition) -> Self {
        let forehand = dealer.next();
        Self {
            hands: deck.hands(),
            dealer,
            forehand,
            declarer: None,
            trump: None,
            pushed: false,
            current_trick: Trick::new(forehand),
            trick_history: Vec::with_capacity(TRICKS_PER_GAME),
            scores: ScoreBoard::new(),
        }
    }

    /// Starts play directly from known hands with `leader` to lead the first trick.
    pub fn from_hands(hands: [Hand; 4], trump: Trump, leader: PlayerPosition) -> Self {
        Self {
            hands,
            dealer: leader.previous(),
            forehand: leader,
            declarer: Some(leader),
            trump: Some(trump),
            pushed: false,
            current_trick: Trick::new(leader),
            trick_history: Vec::with_capacity(TRICKS_PER_GAME),
            scores: ScoreBoard::new(),
        }
    }

    /// Rebuilds a full world from what `observation` shows plus a guess at every hand.
    pub fn from_observation(observation: &Observation, hands: [Hand; 4]) -> Self {
        Self {
            hands,
            dealer: observation.dealer,
            forehand: observation.forehand,
            declarer: observation.declarer,
            trump: observation.trump,
            pushed: observation.pushed,
            current_trick: observation.current_trick,
            trick_history: observation.trick_history.clone(),
            scores: observation.scores,
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.trump.is_none() {
            GamePhase::Declaring
        } else if self.trick_history.len() >= TRICKS_PER_GAME || self.out_of_cards() {
            GamePhase::Finished
        } else {
            GamePhase::Playing
        }
    }

    /// Constructed endgames hold fewer than nine tricks; they end when the cards do.
    fn out_of_cards(&self) -> bool {
        self.current_trick.is_empty() && self.hands.iter().all(|hand| hand.is_empty())
    }

    pub fn hand(&self, seat: PlayerPosition) -> Hand {
        self.hands[seat.index()]
    }

    pub fn hands(&self) -> &[Hand; 4] {
        &self.hands
    }

    pub fn dealer(&self) -> PlayerPosition {
        self.dealer
    }

    pub fn forehand(&self) -> PlayerPosition {
        self.forehand
    }

    pub fn declarer(&self) -> Option<PlayerPosition> {
        self.declarer
    }

    pub fn trump(&self) -> Option<Trump> {
        self.trump
    }

    pub fn pushed(&self) -> bool {
        self.pushed
    }

    pub fn current_trick(&self) -> &Trick {
        &self.current_trick
    }

    pub fn trick_history(&self) -> &[TrickRecord] {
        &self.trick_history
    }

    pub fn tricks_completed(&self) -> usize {
        self.trick_history.len()
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    /// Running per-team points, North/South first.
    pub fn points(&self) -> [u32; 2] {
        self.scores.standings()
    }

    /// Seat that must answer the trump question, while trump is open.
    pub fn declaring_seat(&self) -> Option<PlayerPosition> {
        match self.trump {
            Some(_) => None,
            None if self.pushed => Some(self.forehand.opposite()),
            None => Some(self.forehand),
        }
    }

    pub fn push_allowed(&self) -> bool {
        self.trump.is_none() && !self.pushed
    }

    pub fn to_move(&self) -> Option<PlayerPosition> {
        match self.phase() {
            GamePhase::Declaring => self.declaring_seat(),
            GamePhase::Playing => Some(self.current_trick.expected_position()),
            GamePhase::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == GamePhase::Finished
    }

    pub fn declare(
        &mut self,
        seat: PlayerPosition,
        choice: TrumpChoice,
    ) -> Result<(), DeclareError> {
        let expected = self.declaring_seat().ok_or(DeclareError::AlreadyDeclared)?;
        if expected != seat {
            return Err(DeclareError::OutOfTurn {
                expected,
                actual: seat,
            });
        }
        match choice {
            TrumpChoice::Push if self.pushed => Err(DeclareError::PushNotAllowed),
            TrumpChoice::Push => {
                self.pushed = true;
                Ok(())
            }
            TrumpChoice::Declare(trump) => {
                self.trump = Some(trump);
                self.declarer = Some(seat);
                Ok(())
            }
        }
    }

    /// Cards the seat to move may play; empty outside the playing phase.
    pub fn legal_cards(&self) -> Hand {
        match (self.phase(), self.trump) {
            (GamePhase::Playing, Some(trump)) => {
                let seat = self.current_trick.expected_position();
                rules::legal_cards(self.hand(seat), &self.current_trick, trump)
            }
            _ => Hand::new(),
        }
    }

    pub fn play_card(
        &mut self,
        seat: PlayerPosition,
        card: Card,
    ) -> Result<PlayOutcome, PlayError> {
        let trump = match (self.phase(), self.trump) {
            (GamePhase::Playing, Some(trump)) => trump,
            _ => return Err(PlayError::NotInPlayPhase),
        };

        if !self.hands[seat.index()].contains(card) {
            return Err(PlayError::CardNotInHand(card));
        }

        let expected = self.current_trick.expected_position();
        if expected != seat {
            return Err(PlayError::OutOfTurn {
                expected,
                actual: seat,
            });
        }

        if !self.legal_cards().contains(card) {
            return Err(PlayError::IllegalCard(card));
        }

        self.current_trick.play(seat, card).map_err(PlayError::Trick)?;
        self.hands[seat.index()].remove(card);

        if !self.current_trick.is_complete() {
            return Ok(PlayOutcome::Played);
        }

        let is_last = self.hands.iter().all(|hand| hand.is_empty());
        let winner =
            rules::trick_winner(&self.current_trick, trump).unwrap_or(self.current_trick.leader());
        let points = rules::trick_points(&self.current_trick, trump, is_last);
        let finished = std::mem::replace(&mut self.current_trick, Trick::new(winner));
        self.trick_history.push(TrickRecord {
            trick: finished,
            winner,
            points,
        });
        self.scores.add_points(winner.team(), points);
        Ok(PlayOutcome::TrickCompleted { winner, points })
    }

    /// Plays `card` for whichever seat is to move.
    pub fn play(&mut self, card: Card) -> Result<PlayOutcome, PlayError> {
        let seat = self.current_trick.expected_position();
        self.play_card(seat, card)
    }

    /// Copy-on-apply: returns the successor world and leaves `self` untouched.
    pub fn apply_card(&self, card: Card) -> Result<GameState, PlayError> {
        let mut next = self.clone();
        next.play(card)?;
        Ok(next)
    }

    /// Winner and value of trick `index`, once that trick is finished.
    pub fn trick_result(&self, index: usize) -> Option<(PlayerPosition, u32)> {
        self.trick_history
            .get(index)
            .map(|record| (record.winner, record.points))
    }

    /// Team totals, only once all nine tricks are played.
    pub fn final_scores(&self) -> Option<[u32; 2]> {
        self.is_finished().then(|| self.scores.standings())
    }

    /// Cards already on the table, finished tricks and the open trick alike.
    pub fn played_cards(&self) -> Hand {
        self.trick_history
            .iter()
            .map(|record| record.trick.card_set())
            .fold(self.current_trick.card_set(), Hand::union)
    }

    pub fn observation_for(&self, seat: PlayerPosition) -> Observation {
        Observation {
            seat,
            hand: self.hand(seat),
            dealer: self.dealer,
            forehand: self.forehand,
            declarer: self.declarer,
            trump: self.trump,
            pushed: self.pushed,
            push_allowed: self.push_allowed() && self.declaring_seat() == Some(seat),
            current_trick: self.current_trick,
            trick_history: self.trick_history.clone(),
            scores: self.scores,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Played,
    TrickCompleted { winner: PlayerPosition, points: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    NotInPlayPhase,
    CardNotInHand(Card),
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    IllegalCard(Card),
    Trick(TrickError),
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::NotInPlayPhase => write!(f, "game is not in the playing phase"),
            PlayError::CardNotInHand(card) => write!(f, "{card} is not in the hand to move"),
            PlayError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to play next but got {actual}")
            }
            PlayError::IllegalCard(card) => write!(f, "{card} is not a legal card here"),
            PlayError::Trick(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlayError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclareError {
    AlreadyDeclared,
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
    PushNotAllowed,
}

impl fmt::Display for DeclareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclareError::AlreadyDeclared => write!(f, "trump has already been declared"),
            DeclareError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to declare trump but got {actual}")
            }
            DeclareError::PushNotAllowed => write!(f, "trump was already pushed once"),
        }
    }
}

impl std::error::Error for DeclareError {}
