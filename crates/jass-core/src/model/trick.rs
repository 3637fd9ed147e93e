use crate::model::card::Card;
use crate::model::color::Color;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::trump::Trump;
use crate::rules;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trick {
    leader: PlayerPosition,
    cards: [Option<Card>; 4],
    len: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub position: PlayerPosition,
    pub card: Card,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrickError {
    TrickComplete,
    OutOfTurn {
        expected: PlayerPosition,
        actual: PlayerPosition,
    },
}

impl fmt::Display for TrickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrickError::TrickComplete => write!(f, "trick already complete"),
            TrickError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to play next but got {actual}")
            }
        }
    }
}

impl std::error::Error for TrickError {}

impl Trick {
    pub const fn new(leader: PlayerPosition) -> Self {
        Self {
            leader,
            cards: [None; 4],
            len: 0,
        }
    }

    pub const fn leader(&self) -> PlayerPosition {
        self.leader
    }

    pub const fn len(&self) -> usize {
        self.len as usize
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn is_complete(&self) -> bool {
        self.len == 4
    }

    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.cards.iter().take(self.len()).flatten().copied()
    }

    pub fn plays(&self) -> impl Iterator<Item = Play> + '_ {
        let leader = self.leader;
        self.cards()
            .enumerate()
            .map(move |(offset, card)| Play {
                position: leader.advance(offset),
                card,
            })
    }

    pub fn card_set(&self) -> Hand {
        self.cards().collect()
    }

    pub fn lead_card(&self) -> Option<Card> {
        self.cards[0]
    }

    pub fn lead_color(&self) -> Option<Color> {
        self.lead_card().map(Card::color)
    }

    pub const fn expected_position(&self) -> PlayerPosition {
        self.leader.advance(self.len as usize)
    }

    pub fn play(&mut self, position: PlayerPosition, card: Card) -> Result<(), TrickError> {
        if self.is_complete() {
            return Err(TrickError::TrickComplete);
        }

        let expected = self.expected_position();
        if expected != position {
            return Err(TrickError::OutOfTurn {
                expected,
                actual: position,
            });
        }

        self.cards[self.len()] = Some(card);
        self.len += 1;
        Ok(())
    }

    pub fn winner(&self, trump: Trump) -> Option<PlayerPosition> {
        if !self.is_complete() {
            return None;
        }
        rules::trick_winner(self, trump)
    }

    pub fn points(&self, trump: Trump, is_last: bool) -> u32 {
        rules::trick_points(self, trump, is_last)
    }
}

/// A finished trick with its resolved winner and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickRecord {
    pub trick: Trick,
    pub winner: PlayerPosition,
    pub points: u32,
}
