use crate::model::color::Color;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DECK_SIZE: usize = 36;

/// One of the 36 cards, identified by `color * 9 + rank offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card(u8);

impl Card {
    pub const fn new(rank: Rank, color: Color) -> Self {
        Self(color as u8 * 9 + rank as u8)
    }

    pub const fn from_id(id: u8) -> Option<Self> {
        if (id as usize) < DECK_SIZE {
            Some(Self(id))
        } else {
            None
        }
    }

    pub const fn id(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn color(self) -> Color {
        match self.0 / 9 {
            0 => Color::Diamonds,
            1 => Color::Hearts,
            2 => Color::Spades,
            _ => Color::Clubs,
        }
    }

    pub const fn rank(self) -> Rank {
        match self.0 % 9 {
            0 => Rank::Ace,
            1 => Rank::King,
            2 => Rank::Queen,
            3 => Rank::Jack,
            4 => Rank::Ten,
            5 => Rank::Nine,
            6 => Rank::Eight,
            7 => Rank::Seven,
            _ => Rank::Six,
        }
    }

    pub fn all() -> impl Iterator<Item = Card> {
        (0..DECK_SIZE as u8).map(Card)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color(), self.rank())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardParseError(String);

impl fmt::Display for CardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid card notation '{}'", self.0)
    }
}

impl std::error::Error for CardParseError {}

impl FromStr for Card {
    type Err = CardParseError;

    /// Parses the `D10` / `HA` / `SJ` notation used by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CardParseError(s.to_string());
        let mut chars = s.trim().chars();
        let color = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('D') => Color::Diamonds,
            Some('H') => Color::Hearts,
            Some('S') => Color::Spades,
            Some('C') => Color::Clubs,
            _ => return Err(err()),
        };
        let rank = match chars.as_str().to_ascii_uppercase().as_str() {
            "A" => Rank::Ace,
            "K" => Rank::King,
            "Q" => Rank::Queen,
            "J" => Rank::Jack,
            "10" => Rank::Ten,
            "9" => Rank::Nine,
            "8" => Rank::Eight,
            "7" => Rank::Seven,
            "6" => Rank::Six,
            _ => return Err(err()),
        };
        Ok(Card::new(rank, color))
    }
}
