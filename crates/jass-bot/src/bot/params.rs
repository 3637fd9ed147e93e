use crate::bot::rollout::RewardScale;

/// Search budgets and knobs, overridable through `JASS_*` environment variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub iterations: usize,
    pub exploration: f64,
    pub reward: RewardScale,
    /// Determinized worlds the trick solver averages over when it cannot see every hand.
    pub minimax_samples: usize,
    pub simulations_per_card: usize,
    pub workers: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            iterations: 200,
            exploration: 1.4,
            reward: RewardScale::Differential,
            minimax_samples: 8,
            simulations_per_card: 50,
            workers: 1,
        }
    }
}

impl SearchParams {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let count = |raw: Option<String>, fallback: usize| {
            raw.and_then(|raw| raw.trim().parse::<usize>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(fallback)
        };

        let iterations = count(read("JASS_MCTS_ITERATIONS"), defaults.iterations);
        let exploration = read("JASS_MCTS_EXPLORATION")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value >= 0.0)
            .unwrap_or(defaults.exploration);
        let reward = read("JASS_MCTS_REWARD")
            .and_then(|raw| RewardScale::parse(&raw))
            .unwrap_or(defaults.reward);
        let minimax_samples = count(read("JASS_MINIMAX_SAMPLES"), defaults.minimax_samples);
        let simulations_per_card =
            count(read("JASS_FLAT_SIMULATIONS"), defaults.simulations_per_card);
        let workers = count(read("JASS_MCTS_WORKERS"), defaults.workers);

        Self {
            iterations,
            exploration,
            reward,
            minimax_samples,
            simulations_per_card,
            workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SearchParams;
    use crate::bot::rollout::RewardScale;
    use std::collections::HashMap;

    #[test]
    fn from_reader_defaults() {
        let params = SearchParams::from_reader(|_| None);
        assert_eq!(params, SearchParams::default());
        assert_eq!(params.iterations, 200);
        assert!((params.exploration - 1.4).abs() < f64::EPSILON);
    }

    #[test]
    fn from_reader_respects_overrides_and_rejects_junk() {
        let mut vars = HashMap::new();
        vars.insert("JASS_MCTS_ITERATIONS", "64");
        vars.insert("JASS_MCTS_EXPLORATION", "-3");
        vars.insert("JASS_MCTS_REWARD", "points");
        vars.insert("JASS_MCTS_WORKERS", "0");
        vars.insert("JASS_FLAT_SIMULATIONS", "12");

        let params = SearchParams::from_reader(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(params.iterations, 64);
        assert!((params.exploration - 1.4).abs() < f64::EPSILON);
        assert_eq!(params.reward, RewardScale::TeamPoints);
        assert_eq!(params.workers, 1);
        assert_eq!(params.simulations_per_card, 12);
        assert_eq!(params.minimax_samples, 8);
    }
}
