use crate::model::deck::HAND_SIZE;
use crate::model::hand::Hand;
use crate::model::player::{PlayerPosition, Team};
use crate::model::score::ScoreBoard;
use crate::model::trick::{Trick, TrickRecord};
use crate::model::trump::Trump;
use crate::rules;
use serde::{Deserialize, Serialize};

/// Everything `seat` may legally know about a game in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub seat: PlayerPosition,
    pub hand: Hand,
    pub dealer: PlayerPosition,
    pub forehand: PlayerPosition,
    pub declarer: Option<PlayerPosition>,
    pub trump: Option<Trump>,
    pub pushed: bool,
    /// Resolved when the observation is built: `seat` is asked for trump and may still push.
    pub push_allowed: bool,
    pub current_trick: Trick,
    pub trick_history: Vec<TrickRecord>,
    pub scores: ScoreBoard,
}

impl Observation {
    pub fn team(&self) -> Team {
        self.seat.team()
    }

    pub fn tricks_completed(&self) -> usize {
        self.trick_history.len()
    }

    pub fn is_declaring(&self) -> bool {
        self.trump.is_none()
    }

    pub fn to_move(&self) -> Option<PlayerPosition> {
        match self.trump {
            None if self.pushed => Some(self.forehand.opposite()),
            None => Some(self.forehand),
            Some(_) if self.trick_history.len() >= HAND_SIZE => None,
            Some(_) if self.hand.is_empty() && self.current_trick.is_empty() => None,
            Some(_) => Some(self.current_trick.expected_position()),
        }
    }

    /// Legal cards for the observer; empty unless it is the observer's turn to play.
    pub fn legal_cards(&self) -> Hand {
        match self.trump {
            Some(trump) if self.to_move() == Some(self.seat) => {
                rules::legal_cards(self.hand, &self.current_trick, trump)
            }
            _ => Hand::new(),
        }
    }

    pub fn played_cards(&self) -> Hand {
        self.trick_history
            .iter()
            .map(|record| record.trick.card_set())
            .fold(self.current_trick.card_set(), Hand::union)
    }

    pub fn cards_played_by(&self, seat: PlayerPosition) -> usize {
        let finished = self
            .trick_history
            .iter()
            .flat_map(|record| record.trick.plays())
            .filter(|play| play.position == seat)
            .count();
        let open = self
            .current_trick
            .plays()
            .filter(|play| play.position == seat)
            .count();
        finished + open
    }

    /// Cards `seat` still holds, derived from what it has played.
    pub fn remaining_for(&self, seat: PlayerPosition) -> usize {
        HAND_SIZE.saturating_sub(self.cards_played_by(seat))
    }

    /// Snapshot for logs and fixtures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::deck::Deck;
    use crate::model::player::PlayerPosition;
    use crate::model::round::GameState;
    use crate::model::trump::{Trump, TrumpChoice};

    #[test]
    fn push_flag_only_for_declaring_seat() {
        let game = GameState::deal(&Deck::shuffled_with_seed(2), PlayerPosition::North);
        assert!(game.observation_for(PlayerPosition::East).push_allowed);
        assert!(!game.observation_for(PlayerPosition::West).push_allowed);
    }

    #[test]
    fn observation_tracks_played_cards_per_seat() {
        let mut game = GameState::deal(&Deck::shuffled_with_seed(8), PlayerPosition::North);
        game.declare(PlayerPosition::East, TrumpChoice::Declare(Trump::Hearts))
            .unwrap();
        for _ in 0..6 {
            let card = game.legal_cards().first().unwrap();
            game.play(card).unwrap();
        }
        let obs = game.observation_for(PlayerPosition::South);
        assert_eq!(obs.played_cards().len(), 6);
        assert_eq!(obs.tricks_completed(), 1);
        let total: usize = PlayerPosition::LOOP
            .iter()
            .map(|seat| obs.cards_played_by(*seat))
            .sum();
        assert_eq!(total, 6);
        assert_eq!(
            obs.remaining_for(PlayerPosition::South),
            9 - obs.cards_played_by(PlayerPosition::South)
        );
        assert_eq!(obs.hand.len(), obs.remaining_for(PlayerPosition::South));
        assert!(obs.played_cards().is_disjoint(obs.hand));
    }

    #[test]
    fn legal_cards_empty_when_not_observers_turn() {
        let mut game = GameState::deal(&Deck::shuffled_with_seed(9), PlayerPosition::North);
        game.declare(PlayerPosition::East, TrumpChoice::Declare(Trump::UneUfe))
            .unwrap();
        let mover = game.to_move().unwrap();
        assert!(!game.observation_for(mover).legal_cards().is_empty());
        assert!(game.observation_for(mover.next()).legal_cards().is_empty());
        assert_eq!(game.observation_for(mover).legal_cards(), game.legal_cards());
    }

    #[test]
    fn snapshot_survives_json() {
        let mut game = GameState::deal(&Deck::shuffled_with_seed(11), PlayerPosition::South);
        game.declare(PlayerPosition::West, TrumpChoice::Push).unwrap();
        game.declare(PlayerPosition::East, TrumpChoice::Declare(Trump::ObeAbe))
            .unwrap();
        for _ in 0..5 {
            let card = game.legal_cards().first().unwrap();
            game.play(card).unwrap();
        }
        let obs = game.observation_for(PlayerPosition::North);
        let json = obs.to_json().unwrap();
        assert!(json.contains("\"obe_abe\""));
        let restored = super::Observation::from_json(&json).unwrap();
        assert_eq!(restored, obs);
        assert_eq!(restored.legal_cards(), obs.legal_cards());
    }
}
