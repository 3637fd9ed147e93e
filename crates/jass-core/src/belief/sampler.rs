//! World sampling: resolves an observation into one concrete, legal world.

use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::observation::Observation;
use crate::model::player::PlayerPosition;
use crate::model::round::GameState;
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

/// Uniform determinizer: every unseen card is dealt to exactly one opponent.
#[derive(Debug, Default)]
pub struct Determinizer;

impl Determinizer {
    /// Samples a world consistent with `observation`.
    ///
    /// The result depends only on the observation and the state of `rng`.
    pub fn sample<R: Rng + ?Sized>(
        observation: &Observation,
        rng: &mut R,
    ) -> Result<GameState, SamplingError> {
        Self::sample_with_stats(observation, rng, None)
    }

    pub fn sample_with_stats<R: Rng + ?Sized>(
        observation: &Observation,
        rng: &mut R,
        stats: Option<&mut SamplingStats>,
    ) -> Result<GameState, SamplingError> {
        let mut stats = stats;
        if let Some(inner) = stats.as_deref_mut() {
            inner.attempts += 1;
        }
        match Self::sample_hands(observation, rng) {
            Ok(hands) => {
                if let Some(inner) = stats.as_deref_mut() {
                    inner.succeeded += 1;
                }
                Ok(GameState::from_observation(observation, hands))
            }
            Err(err) => {
                if let Some(inner) = stats.as_deref_mut() {
                    inner.rejections += 1;
                }
                Err(err)
            }
        }
    }

    /// Deals the unseen cards to the opponents, observer's hand copied unchanged.
    pub fn sample_hands<R: Rng + ?Sized>(
        observation: &Observation,
        rng: &mut R,
    ) -> Result<[Hand; 4], SamplingError> {
        let perspective = observation.seat;
        let played = observation.played_cards();

        if !played.is_disjoint(observation.hand) {
            return Err(SamplingError::PlayedCardInHand { seat: perspective });
        }
        if observation.hand.len() != observation.remaining_for(perspective) {
            return Err(SamplingError::InconsistentHandSize { seat: perspective });
        }

        let mut unknown: Vec<Card> = Hand::full_deck()
            .difference(played)
            .difference(observation.hand)
            .cards();

        let expected: usize = opponents(perspective)
            .map(|seat| observation.remaining_for(seat))
            .sum();
        if unknown.len() != expected {
            return Err(SamplingError::CountMismatch {
                unknown: unknown.len(),
                expected,
            });
        }

        unknown.shuffle(rng);

        let mut hands = [Hand::new(); 4];
        hands[perspective.index()] = observation.hand;
        let mut cursor = 0usize;
        for seat in opponents(perspective) {
            let need = observation.remaining_for(seat);
            hands[seat.index()] = unknown[cursor..cursor + need].iter().copied().collect();
            cursor += need;
        }

        Ok(hands)
    }
}

fn opponents(perspective: PlayerPosition) -> impl Iterator<Item = PlayerPosition> {
    PlayerPosition::LOOP
        .into_iter()
        .filter(move |seat| *seat != perspective)
}

/// Counters for sampling attempts, kept by callers that want diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingStats {
    pub attempts: usize,
    pub succeeded: usize,
    pub rejections: usize,
}

/// Inconsistent observations. These are precondition failures, never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamplingError {
    InconsistentHandSize { seat: PlayerPosition },
    PlayedCardInHand { seat: PlayerPosition },
    CountMismatch { unknown: usize, expected: usize },
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingError::InconsistentHandSize { seat } => {
                write!(f, "seat {seat} holds a hand that disagrees with its played cards")
            }
            SamplingError::PlayedCardInHand { seat } => {
                write!(f, "seat {seat} still holds a card that was already played")
            }
            SamplingError::CountMismatch { unknown, expected } => write!(
                f,
                "{unknown} unseen cards cannot fill {expected} opponent slots"
            ),
        }
    }
}

impl std::error::Error for SamplingError {}

#[cfg(test)]
mod tests {
    use super::{Determinizer, SamplingError, SamplingStats};
    use crate::model::deck::Deck;
    use crate::model::hand::Hand;
    use crate::model::player::PlayerPosition;
    use crate::model::round::GameState;
    use crate::model::trump::{Trump, TrumpChoice};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn game_after(plays: usize, seed: u64) -> GameState {
        let mut game = GameState::deal(&Deck::shuffled_with_seed(seed), PlayerPosition::North);
        game.declare(PlayerPosition::East, TrumpChoice::Declare(Trump::Spades))
            .unwrap();
        for _ in 0..plays {
            let card = game.legal_cards().first().unwrap();
            game.play(card).unwrap();
        }
        game
    }

    #[test]
    fn fresh_deal_gives_every_seat_nine_cards() {
        let game = game_after(0, 1);
        let obs = game.observation_for(PlayerPosition::South);
        let mut rng = StdRng::seed_from_u64(1);
        let world = Determinizer::sample(&obs, &mut rng).unwrap();
        for seat in PlayerPosition::LOOP {
            assert_eq!(world.hand(seat).len(), 9);
        }
        assert_eq!(world.hand(PlayerPosition::South), game.hand(PlayerPosition::South));
    }

    #[test]
    fn mid_trick_counts_follow_played_cards() {
        let game = game_after(11, 4);
        let obs = game.observation_for(PlayerPosition::West);
        let mut rng = StdRng::seed_from_u64(99);
        let world = Determinizer::sample(&obs, &mut rng).unwrap();
        let mut union = world.played_cards();
        for seat in PlayerPosition::LOOP {
            assert_eq!(world.hand(seat).len(), game.hand(seat).len(), "{seat}");
            assert!(union.is_disjoint(world.hand(seat)));
            union = union.union(world.hand(seat));
        }
        assert_eq!(union, Hand::full_deck());
        assert_eq!(world.current_trick(), game.current_trick());
        assert_eq!(world.to_move(), game.to_move());
    }

    #[test]
    fn same_seed_gives_same_world() {
        let obs = game_after(5, 12).observation_for(PlayerPosition::North);
        let a = Determinizer::sample(&obs, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Determinizer::sample(&obs, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn corrupted_observation_is_a_precondition_failure() {
        let mut obs = game_after(0, 3).observation_for(PlayerPosition::North);
        let stolen = obs.hand.first().unwrap();
        obs.hand.remove(stolen);
        let mut stats = SamplingStats::default();
        let err = Determinizer::sample_with_stats(
            &obs,
            &mut StdRng::seed_from_u64(0),
            Some(&mut stats),
        )
        .unwrap_err();
        assert_eq!(err, SamplingError::InconsistentHandSize { seat: PlayerPosition::North });
        assert_eq!(stats.rejections, 1);
        assert_eq!(stats.succeeded, 0);
    }

    #[test]
    fn count_mismatch_is_reported() {
        let game = game_after(4, 6);
        let mut obs = game.observation_for(PlayerPosition::East);
        // Drop a finished trick: its cards come back as unseen but no seat may hold them.
        obs.trick_history.clear();
        let err = Determinizer::sample(&obs, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(
            err,
            SamplingError::InconsistentHandSize { .. } | SamplingError::CountMismatch { .. }
        ));
    }
}
