use jass_core::model::card::Card;
use jass_core::model::player::Team;
use jass_core::model::round::GameState;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a finished (or truncated) world is turned into a reward for one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardScale {
    /// Own team's points minus the opponents' points.
    #[default]
    Differential,
    /// Own team's points only.
    TeamPoints,
}

impl RewardScale {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "differential" | "diff" => Some(Self::Differential),
            "points" | "team_points" | "team" => Some(Self::TeamPoints),
            _ => None,
        }
    }

    pub fn reward(self, world: &GameState, team: Team) -> f64 {
        let scores = world.scores();
        match self {
            Self::Differential => scores.differential(team) as f64,
            Self::TeamPoints => f64::from(scores.score(team)),
        }
    }
}

/// Where a rollout stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Horizon {
    #[default]
    Game,
    /// Only the trick in progress when the rollout starts.
    Trick,
}

/// Uniform random playout: no move ordering, no heuristic bias.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutEvaluator {
    scale: RewardScale,
    horizon: Horizon,
}

impl RolloutEvaluator {
    pub const fn new(scale: RewardScale) -> Self {
        Self {
            scale,
            horizon: Horizon::Game,
        }
    }

    pub const fn with_horizon(mut self, horizon: Horizon) -> Self {
        self.horizon = horizon;
        self
    }

    pub const fn scale(&self) -> RewardScale {
        self.scale
    }

    pub const fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn evaluate<R: Rng + ?Sized>(&self, world: GameState, team: Team, rng: &mut R) -> f64 {
        self.evaluate_with(world, team, rng, |_, _| {})
    }

    /// Plays `world` out, calling `observe` with each position and the card about to be played.
    pub fn evaluate_with<R, F>(
        &self,
        mut world: GameState,
        team: Team,
        rng: &mut R,
        mut observe: F,
    ) -> f64
    where
        R: Rng + ?Sized,
        F: FnMut(&GameState, Card),
    {
        let stop_after = match self.horizon {
            Horizon::Game => None,
            Horizon::Trick => Some(world.tricks_completed() + 1),
        };

        while !world.is_finished() {
            if stop_after.is_some_and(|limit| world.tricks_completed() >= limit) {
                break;
            }

            let legal = world.legal_cards();
            if legal.is_empty() {
                tracing::warn!(
                    target: "jass_bot::search",
                    tricks = world.tricks_completed(),
                    seat = ?world.to_move(),
                    "rollout stopped early: no legal cards"
                );
                break;
            }

            let pick = rng.gen_range(0..legal.len());
            let Some(card) = legal.iter().nth(pick) else {
                break;
            };
            observe(&world, card);
            if let Err(err) = world.play(card) {
                tracing::warn!(
                    target: "jass_bot::search",
                    %card,
                    error = %err,
                    "rollout play rejected"
                );
                break;
            }
        }

        self.scale.reward(&world, team)
    }
}

#[cfg(test)]
mod tests {
    use super::{Horizon, RewardScale, RolloutEvaluator};
    use jass_core::model::card::Card;
    use jass_core::model::deck::Deck;
    use jass_core::model::hand::Hand;
    use jass_core::model::player::{PlayerPosition, Team};
    use jass_core::model::round::GameState;
    use jass_core::model::trump::{Trump, TrumpChoice};
    use jass_core::rules::TOTAL_POINTS;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn hand(labels: &[&str]) -> Hand {
        labels.iter().map(|label| label.parse::<Card>().unwrap()).collect()
    }

    fn declared_game(seed: u64) -> GameState {
        let mut game = GameState::deal(&Deck::shuffled_with_seed(seed), PlayerPosition::North);
        game.declare(PlayerPosition::East, TrumpChoice::Declare(Trump::Diamonds))
            .unwrap();
        game
    }

    #[test]
    fn differential_is_zero_sum_over_a_full_game() {
        let evaluator = RolloutEvaluator::new(RewardScale::Differential);
        let game = declared_game(1);
        let ns = evaluator.evaluate(game.clone(), Team::NorthSouth, &mut StdRng::seed_from_u64(5));
        let ew = evaluator.evaluate(game, Team::EastWest, &mut StdRng::seed_from_u64(5));
        assert_eq!(ns, -ew);
    }

    #[test]
    fn team_points_reward_stays_within_total() {
        let evaluator = RolloutEvaluator::new(RewardScale::TeamPoints);
        let mut rng = StdRng::seed_from_u64(2);
        for seed in 0..10 {
            let reward = evaluator.evaluate(declared_game(seed), Team::EastWest, &mut rng);
            assert!((0.0..=f64::from(TOTAL_POINTS)).contains(&reward));
        }
    }

    #[test]
    fn trick_horizon_plays_exactly_one_trick() {
        let evaluator = RolloutEvaluator::new(RewardScale::TeamPoints).with_horizon(Horizon::Trick);
        let mut plays = 0;
        evaluator.evaluate_with(
            declared_game(3),
            Team::NorthSouth,
            &mut StdRng::seed_from_u64(9),
            |_, _| plays += 1,
        );
        assert_eq!(plays, 4);
    }

    #[test]
    fn finished_world_is_scored_without_playing() {
        let evaluator = RolloutEvaluator::new(RewardScale::Differential);
        let mut game = declared_game(4);
        while !game.is_finished() {
            let card = game.legal_cards().first().unwrap();
            game.play(card).unwrap();
        }
        let expected = game.scores().differential(Team::NorthSouth) as f64;
        let mut plays = 0;
        let reward = evaluator.evaluate_with(
            game,
            Team::NorthSouth,
            &mut StdRng::seed_from_u64(0),
            |_, _| plays += 1,
        );
        assert_eq!(plays, 0);
        assert_eq!(reward, expected);
    }

    #[test]
    fn empty_hand_stops_the_playout() {
        let hands = [hand(&["D6", "S6"]), hand(&["DA"]), hand(&["D7"]), hand(&["D8"])];
        let evaluator = RolloutEvaluator::new(RewardScale::Differential);
        for seed in 0..8 {
            let world = GameState::from_hands(hands, Trump::Hearts, PlayerPosition::North);
            let mut plays = 0;
            let reward = evaluator.evaluate_with(
                world,
                Team::EastWest,
                &mut StdRng::seed_from_u64(seed),
                |_, _| plays += 1,
            );
            // D6 lead: East takes the Ace and has nothing to lead.
            // S6 lead: North takes it, leads D6, and East is out.
            match plays {
                4 => assert_eq!(reward, 11.0),
                5 => assert_eq!(reward, -11.0),
                other => panic!("playout ran {other} cards"),
            }
        }
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(RewardScale::parse("Differential"), Some(RewardScale::Differential));
        assert_eq!(RewardScale::parse(" points "), Some(RewardScale::TeamPoints));
        assert_eq!(RewardScale::parse("elo"), None);
    }
}
