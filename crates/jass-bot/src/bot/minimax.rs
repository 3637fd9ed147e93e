use jass_core::model::card::Card;
use jass_core::model::player::Team;
use jass_core::model::round::GameState;

/// Best card for the seat to move, valued over the rest of the current trick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolvedMove {
    pub card: Card,
    /// `None` when the move was forced and nothing was searched.
    pub value: Option<i32>,
    pub nodes: usize,
}

/// Exact minimax over the trick in progress; later tricks are never looked at.
///
/// A finished trick is worth `+points` to the team that took it and `-points`
/// to the other. Alpha-beta cuts are value preserving and can be switched off
/// to compare against the full-width search.
#[derive(Debug, Clone, Copy)]
pub struct TrickSolver {
    alpha_beta: bool,
}

impl Default for TrickSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TrickSolver {
    pub const fn new() -> Self {
        Self { alpha_beta: true }
    }

    pub const fn full_width() -> Self {
        Self { alpha_beta: false }
    }

    pub fn solve(&self, world: &GameState) -> Option<SolvedMove> {
        let legal = world.legal_cards();
        let first = legal.first()?;
        if legal.len() == 1 {
            return Some(SolvedMove {
                card: first,
                value: None,
                nodes: 0,
            });
        }

        let mut nodes = 0;
        let values = self.card_values_counted(world, &mut nodes);
        let mut best: Option<(Card, i32)> = None;
        for (card, value) in values {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((card, value)),
            }
        }
        best.map(|(card, value)| SolvedMove {
            card,
            value: Some(value),
            nodes,
        })
    }

    /// Exact value of every legal card for the seat to move, in enumeration order.
    pub fn card_values(&self, world: &GameState) -> Vec<(Card, i32)> {
        let mut nodes = 0;
        self.card_values_counted(world, &mut nodes)
    }

    /// Value of `world` for `team` once trick `trick_index` is finished.
    pub fn evaluate(&self, world: &GameState, team: Team, trick_index: usize) -> i32 {
        let mut nodes = 0;
        self.search(world, team, trick_index, i32::MIN, i32::MAX, &mut nodes)
    }

    fn card_values_counted(&self, world: &GameState, nodes: &mut usize) -> Vec<(Card, i32)> {
        let Some(seat) = world.to_move() else {
            return Vec::new();
        };
        let team = seat.team();
        let trick_index = world.tricks_completed();

        world
            .legal_cards()
            .iter()
            .filter_map(|card| {
                let child = world.apply_card(card).ok()?;
                // Each root card gets a full window so its value is exact.
                let value = self.search(&child, team, trick_index, i32::MIN, i32::MAX, nodes);
                Some((card, value))
            })
            .collect()
    }

    fn search(
        &self,
        world: &GameState,
        team: Team,
        trick_index: usize,
        mut alpha: i32,
        mut beta: i32,
        nodes: &mut usize,
    ) -> i32 {
        *nodes += 1;

        if let Some((winner, points)) = world.trick_result(trick_index) {
            let points = points as i32;
            return if winner.team() == team { points } else { -points };
        }

        let Some(seat) = world.to_move() else {
            return 0;
        };
        let legal = world.legal_cards();
        if legal.is_empty() {
            tracing::warn!(
                target: "jass_bot::search",
                seat = %seat,
                trick = trick_index,
                "trick search found no legal cards"
            );
            return 0;
        }

        let maximizing = seat.team() == team;
        let mut best: Option<i32> = None;
        for card in legal.iter() {
            let Ok(child) = world.apply_card(card) else {
                continue;
            };
            let value = self.search(&child, team, trick_index, alpha, beta, nodes);
            let merged = match best {
                None => value,
                Some(current) if maximizing => current.max(value),
                Some(current) => current.min(value),
            };
            best = Some(merged);

            if maximizing {
                alpha = alpha.max(merged);
            } else {
                beta = beta.min(merged);
            }
            if self.alpha_beta && alpha >= beta {
                break;
            }
        }
        best.unwrap_or(0)
    }
}
