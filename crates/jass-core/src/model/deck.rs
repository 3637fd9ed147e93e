use crate::model::card::{Card, DECK_SIZE};
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::array;

pub const HAND_SIZE: usize = 9;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard() -> Self {
        Self {
            cards: Card::all().collect(),
        }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Splits the deck into four consecutive blocks of nine, North first.
    pub fn hands(&self) -> [Hand; 4] {
        array::from_fn(|seat| {
            self.cards
                .iter()
                .skip(seat * HAND_SIZE)
                .take(HAND_SIZE)
                .copied()
                .collect()
        })
    }

    pub fn hand_for(&self, seat: PlayerPosition) -> Hand {
        self.hands()[seat.index()]
    }
}

const _: () = assert!(HAND_SIZE * 4 == DECK_SIZE);
