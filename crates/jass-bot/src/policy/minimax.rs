use super::{DecisionError, GameView, Policy, PolicyContext, log_play_decision};
use crate::bot::{SearchParams, TrickSolver, TrumpPlanner};
use jass_core::belief::Determinizer;
use jass_core::model::card::Card;
use jass_core::model::trump::TrumpChoice;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Exact play over the current trick.
///
/// With every hand visible the solver runs once. From an observation the
/// card values are summed over several determinized worlds.
pub struct MinimaxPolicy {
    solver: TrickSolver,
    samples: usize,
    rng: StdRng,
}

impl MinimaxPolicy {
    pub fn new(samples: usize, seed: u64) -> Self {
        Self {
            solver: TrickSolver::new(),
            samples: samples.max(1),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_params(params: &SearchParams, seed: u64) -> Self {
        Self::new(params.minimax_samples, seed)
    }
}

impl Policy for MinimaxPolicy {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn choose_trump(&mut self, ctx: &PolicyContext<'_>) -> Result<TrumpChoice, DecisionError> {
        ctx.require_declaring()?;
        Ok(TrumpPlanner::choose(ctx.hand(), ctx.push_allowed(), None).choice)
    }

    fn choose_card(&mut self, ctx: &PolicyContext<'_>) -> Result<Card, DecisionError> {
        let legal = ctx.require_legal()?;
        let no_card = DecisionError::NoLegalCards { seat: ctx.seat };
        if legal.len() == 1 {
            let card = legal.first().ok_or(no_card)?;
            log_play_decision(ctx, self.name(), legal, card, "forced");
            return Ok(card);
        }

        let card = match ctx.view {
            GameView::Full(world) => self.solver.solve(world).map(|solved| solved.card),
            GameView::Observed(observation) => {
                let mut totals: Vec<(Card, i64)> = legal.iter().map(|card| (card, 0)).collect();
                for _ in 0..self.samples {
                    let world = Determinizer::sample(observation, &mut self.rng)?;
                    for (card, value) in self.solver.card_values(&world) {
                        if let Some(slot) = totals.iter_mut().find(|(known, _)| *known == card) {
                            slot.1 += i64::from(value);
                        }
                    }
                }
                let mut best: Option<(Card, i64)> = None;
                for (card, total) in totals {
                    match best {
                        Some((_, best_total)) if total <= best_total => {}
                        _ => best = Some((card, total)),
                    }
                }
                best.map(|(card, _)| card)
            }
        }
        .ok_or(no_card)?;

        log_play_decision(ctx, self.name(), legal, card, "trick_minimax");
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::MinimaxPolicy;
    use crate::policy::{Policy, PolicyContext};
    use jass_core::model::card::Card;
    use jass_core::model::deck::Deck;
    use jass_core::model::hand::Hand;
    use jass_core::model::player::PlayerPosition;
    use jass_core::model::round::GameState;
    use jass_core::model::trump::{Trump, TrumpChoice};

    fn hand(labels: &[&str]) -> Hand {
        labels.iter().map(|label| label.parse::<Card>().unwrap()).collect()
    }

    #[test]
    fn full_view_matches_the_solver() {
        let hands = [
            hand(&["DA", "D6"]),
            hand(&["D7", "C6"]),
            hand(&["HJ", "C7"]),
            hand(&["D8", "C8"]),
        ];
        let world = GameState::from_hands(hands, Trump::Hearts, PlayerPosition::North);
        let mut policy = MinimaxPolicy::new(4, 0);
        let card = policy
            .choose_card(&PolicyContext::full(&world, PlayerPosition::North))
            .unwrap();
        assert_eq!(card, "DA".parse().unwrap());
    }

    #[test]
    fn observed_view_returns_a_legal_card() {
        let mut world = GameState::deal(&Deck::shuffled_with_seed(31), PlayerPosition::North);
        world
            .declare(PlayerPosition::East, TrumpChoice::Declare(Trump::Hearts))
            .unwrap();
        for _ in 0..6 {
            let card = world.legal_cards().first().unwrap();
            world.play(card).unwrap();
        }
        let seat = world.to_move().unwrap();
        let observation = world.observation_for(seat);
        let mut policy = MinimaxPolicy::new(6, 11);
        let card = policy
            .choose_card(&PolicyContext::observed(&observation))
            .unwrap();
        assert!(world.legal_cards().contains(card));
    }
}
