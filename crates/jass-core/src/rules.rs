//! Schieber rule oracle: legal cards, trick winners and card values.

use crate::model::card::Card;
use crate::model::color::Color;
use crate::model::hand::Hand;
use crate::model::player::PlayerPosition;
use crate::model::rank::Rank;
use crate::model::trick::Trick;
use crate::model::trump::Trump;

pub const LAST_TRICK_BONUS: u32 = 5;
pub const TOTAL_POINTS: u32 = 157;

// Indexed by rank offset: A, K, Q, J, 10, 9, 8, 7, 6.
const TRUMP_POINTS: [u32; 9] = [11, 4, 3, 20, 10, 14, 0, 0, 0];
const PLAIN_POINTS: [u32; 9] = [11, 4, 3, 2, 10, 0, 0, 0, 0];
const OBE_ABE_POINTS: [u32; 9] = [11, 4, 3, 2, 10, 0, 8, 0, 0];
const UNE_UFE_POINTS: [u32; 9] = [0, 4, 3, 2, 10, 0, 8, 0, 11];

// Higher wins. Jack then Nine lead the trump color.
const TRUMP_STRENGTH: [u8; 9] = [6, 5, 4, 8, 3, 7, 2, 1, 0];

pub fn card_points(card: Card, trump: Trump) -> u32 {
    let offset = card.rank().index();
    match trump {
        Trump::ObeAbe => OBE_ABE_POINTS[offset],
        Trump::UneUfe => UNE_UFE_POINTS[offset],
        _ if trump.color() == Some(card.color()) => TRUMP_POINTS[offset],
        _ => PLAIN_POINTS[offset],
    }
}

pub fn trump_strength(card: Card) -> u8 {
    TRUMP_STRENGTH[card.rank().index()]
}

/// Strength of a card within its own color when no trump is involved.
pub fn plain_strength(card: Card, trump: Trump) -> u8 {
    let offset = card.rank().offset();
    match trump {
        Trump::UneUfe => offset,
        _ => 8 - offset,
    }
}

fn beats(challenger: Card, current: Card, trump: Trump) -> bool {
    if let Some(trump_color) = trump.color() {
        let challenger_trump = challenger.color() == trump_color;
        let current_trump = current.color() == trump_color;
        match (challenger_trump, current_trump) {
            (true, false) => return true,
            (false, true) => return false,
            (true, true) => return trump_strength(challenger) > trump_strength(current),
            (false, false) => {}
        }
    }
    challenger.color() == current.color()
        && plain_strength(challenger, trump) > plain_strength(current, trump)
}

/// Seat holding the strongest card of the trick so far.
pub fn current_winner(trick: &Trick, trump: Trump) -> Option<PlayerPosition> {
    let mut plays = trick.plays();
    let mut best = plays.next()?;
    for play in plays {
        if beats(play.card, best.card, trump) {
            best = play;
        }
    }
    Some(best.position)
}

pub fn trick_winner(trick: &Trick, trump: Trump) -> Option<PlayerPosition> {
    if !trick.is_complete() {
        return None;
    }
    current_winner(trick, trump)
}

pub fn trick_points(trick: &Trick, trump: Trump, is_last: bool) -> u32 {
    let base: u32 = trick.cards().map(|card| card_points(card, trump)).sum();
    if is_last {
        base + LAST_TRICK_BONUS
    } else {
        base
    }
}

/// Cards `hand` may contribute to `trick` under `trump`.
///
/// Never empty when `hand` is non-empty.
pub fn legal_cards(hand: Hand, trick: &Trick, trump: Trump) -> Hand {
    let Some(lead) = trick.lead_card() else {
        return hand;
    };
    if trick.is_complete() {
        return Hand::new();
    }
    let lead_color = lead.color();
    let same_color = hand.of_color(lead_color);

    match trump.color() {
        None => {
            if same_color.is_empty() {
                hand
            } else {
                same_color
            }
        }
        Some(trump_color) if trump_color == lead_color => {
            let buur = Card::new(Rank::Jack, trump_color);
            if same_color.is_empty() || (same_color.len() == 1 && same_color.contains(buur)) {
                hand
            } else {
                same_color
            }
        }
        Some(trump_color) => {
            let trumps = hand.of_color(trump_color);
            let allowed_trumps = allowed_trumps(trumps, trick, trump_color);
            if !same_color.is_empty() {
                return same_color.union(allowed_trumps);
            }
            let candidates = hand.difference(trumps).union(allowed_trumps);
            if candidates.is_empty() {
                hand
            } else {
                candidates
            }
        }
    }
}

fn allowed_trumps(trumps: Hand, trick: &Trick, trump_color: Color) -> Hand {
    let highest_played = trick
        .cards()
        .filter(|card| card.color() == trump_color)
        .map(trump_strength)
        .max();
    match highest_played {
        None => trumps,
        Some(threshold) => trumps
            .iter()
            .filter(|card| trump_strength(*card) > threshold)
            .collect(),
    }
}
