use crate::model::player::Team;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    totals: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { totals: [0; 2] }
    }

    pub const fn from_totals(totals: [u32; 2]) -> Self {
        Self { totals }
    }

    pub fn add_points(&mut self, team: Team, points: u32) {
        self.totals[team.index()] += points;
    }

    pub const fn score(&self, team: Team) -> u32 {
        self.totals[team.index()]
    }

    pub const fn standings(&self) -> [u32; 2] {
        self.totals
    }

    /// `team`'s points minus the other team's points.
    pub fn differential(&self, team: Team) -> i64 {
        self.score(team) as i64 - self.score(team.other()) as i64
    }

    pub fn leading_team(&self) -> Option<Team> {
        match self.totals[0].cmp(&self.totals[1]) {
            std::cmp::Ordering::Greater => Some(Team::NorthSouth),
            std::cmp::Ordering::Less => Some(Team::EastWest),
            std::cmp::Ordering::Equal => None,
        }
    }
}
