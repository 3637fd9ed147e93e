use crate::model::card::{Card, DECK_SIZE};
use crate::model::color::Color;
use serde::{Deserialize, Serialize};
use std::fmt;

const COLOR_MASK: u64 = 0x1ff;
const FULL_MASK: u64 = (1u64 << DECK_SIZE) - 1;

/// A set of cards stored as a 36-bit indicator mask.
///
/// Iteration always yields cards in ascending id order; search code relies on
/// that order for reproducible tie-breaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    bits: u64,
}

impl Hand {
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    pub const fn full_deck() -> Self {
        Self { bits: FULL_MASK }
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self {
            bits: bits & FULL_MASK,
        }
    }

    pub fn with_cards<I: IntoIterator<Item = Card>>(cards: I) -> Self {
        let mut hand = Self::new();
        for card in cards {
            hand.add(card);
        }
        hand
    }

    pub const fn bits(self) -> u64 {
        self.bits
    }

    pub fn add(&mut self, card: Card) {
        self.bits |= 1u64 << card.index();
    }

    pub fn remove(&mut self, card: Card) -> bool {
        let present = self.contains(card);
        self.bits &= !(1u64 << card.index());
        present
    }

    pub const fn contains(self, card: Card) -> bool {
        self.bits & (1u64 << card.index()) != 0
    }

    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Card> {
        let mut bits = self.bits;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            let id = bits.trailing_zeros() as u8;
            bits &= bits - 1;
            Card::from_id(id)
        })
    }

    pub fn cards(self) -> Vec<Card> {
        self.iter().collect()
    }

    pub fn first(self) -> Option<Card> {
        self.iter().next()
    }

    pub const fn of_color(self, color: Color) -> Hand {
        Hand {
            bits: self.bits & (COLOR_MASK << (color as u64 * 9)),
        }
    }

    pub const fn count_color(self, color: Color) -> usize {
        self.of_color(color).len()
    }

    pub const fn union(self, other: Hand) -> Hand {
        Hand {
            bits: self.bits | other.bits,
        }
    }

    pub const fn intersection(self, other: Hand) -> Hand {
        Hand {
            bits: self.bits & other.bits,
        }
    }

    pub const fn difference(self, other: Hand) -> Hand {
        Hand {
            bits: self.bits & !other.bits,
        }
    }

    pub const fn is_disjoint(self, other: Hand) -> bool {
        self.bits & other.bits == 0
    }

    /// Indicator encoding used as classifier input.
    pub fn to_one_hot(self) -> [f32; DECK_SIZE] {
        let mut encoded = [0.0f32; DECK_SIZE];
        for card in self.iter() {
            encoded[card.index()] = 1.0;
        }
        encoded
    }

    pub fn from_one_hot(encoded: &[f32]) -> Self {
        Self::with_cards(
            encoded
                .iter()
                .take(DECK_SIZE)
                .enumerate()
                .filter(|(_, value)| **value > 0.5)
                .filter_map(|(id, _)| Card::from_id(id as u8)),
        )
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        Self::with_cards(iter)
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for card in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{card}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Hand;
    use crate::model::card::Card;
    use crate::model::color::Color;
    use crate::model::rank::Rank;

    #[test]
    fn add_and_remove_cards() {
        let mut hand = Hand::new();
        let card = Card::new(Rank::Nine, Color::Clubs);
        hand.add(card);
        assert!(hand.contains(card));
        assert!(hand.remove(card));
        assert!(!hand.contains(card));
        assert!(!hand.remove(card));
    }

    #[test]
    fn iteration_is_ascending_by_id() {
        let hand = Hand::with_cards([
            Card::new(Rank::King, Color::Spades),
            Card::new(Rank::Six, Color::Diamonds),
            Card::new(Rank::Ace, Color::Diamonds),
        ]);
        let ordered = hand.cards();
        assert_eq!(ordered[0], Card::new(Rank::Ace, Color::Diamonds));
        assert_eq!(ordered[1], Card::new(Rank::Six, Color::Diamonds));
        assert_eq!(ordered[2], Card::new(Rank::King, Color::Spades));
    }

    #[test]
    fn color_filter_selects_nine_bit_block() {
        let full = Hand::full_deck();
        assert_eq!(full.len(), 36);
        for color in Color::ALL {
            let block = full.of_color(color);
            assert_eq!(block.len(), 9);
            assert!(block.iter().all(|card| card.color() == color));
        }
    }

    #[test]
    fn set_operations() {
        let a = Hand::with_cards([
            Card::new(Rank::Ace, Color::Hearts),
            Card::new(Rank::Ten, Color::Hearts),
        ]);
        let b = Hand::with_cards([Card::new(Rank::Ten, Color::Hearts)]);
        assert_eq!(a.difference(b).len(), 1);
        assert_eq!(a.intersection(b), b);
        assert!(!a.is_disjoint(b));
        assert_eq!(a.union(b), a);
    }

    #[test]
    fn one_hot_roundtrip() {
        let hand = Hand::with_cards([
            Card::new(Rank::Jack, Color::Clubs),
            Card::new(Rank::Seven, Color::Hearts),
        ]);
        let encoded = hand.to_one_hot();
        assert_eq!(encoded.iter().filter(|v| **v > 0.0).count(), 2);
        assert_eq!(Hand::from_one_hot(&encoded), hand);
    }
}
