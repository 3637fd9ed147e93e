use std::path::{Path, PathBuf};
use std::sync::Arc;

use jass_bot::bot::{MlpTrumpClassifier, RewardScale, SearchParams, TrumpClassifier};
use jass_bot::policy::{
    FlatMonteCarloPolicy, HeuristicPolicy, MctsPolicy, MinimaxPolicy, Policy, RandomPolicy,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::config::{AgentConfig, AgentKind};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid parameters for agent '{name}': {message}")]
    InvalidParam { name: String, message: String },
    #[error("parameter '{param}' does not apply to {kind:?} agent '{name}'")]
    UnsupportedParam {
        name: String,
        kind: AgentKind,
        param: &'static str,
    },
}

/// Knobs an agent may set in its `params` mapping. Unset fields fall back to
/// `SearchParams::from_env()`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct AgentParams {
    iterations: Option<usize>,
    exploration: Option<f64>,
    reward: Option<RewardScale>,
    workers: Option<usize>,
    samples: Option<usize>,
    simulations: Option<usize>,
    classifier: Option<PathBuf>,
}

impl AgentParams {
    fn from_value(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        if params.is_null() {
            return Ok(Self::default());
        }
        let parsed: Self =
            serde_yaml::from_value(params.clone()).map_err(|err| AgentError::InvalidParam {
                name: name.to_string(),
                message: err.to_string(),
            })?;
        if let Some(exploration) = parsed.exploration {
            if !exploration.is_finite() || exploration < 0.0 {
                return Err(AgentError::InvalidParam {
                    name: name.to_string(),
                    message: format!(
                        "exploration must be finite and non-negative, got {exploration}"
                    ),
                });
            }
        }
        Ok(parsed)
    }

    fn search_params(&self, base: SearchParams) -> SearchParams {
        SearchParams {
            iterations: self.iterations.unwrap_or(base.iterations).max(1),
            exploration: self.exploration.unwrap_or(base.exploration),
            reward: self.reward.unwrap_or(base.reward),
            minimax_samples: self.samples.unwrap_or(base.minimax_samples).max(1),
            simulations_per_card: self.simulations.unwrap_or(base.simulations_per_card).max(1),
            workers: self.workers.unwrap_or(base.workers).max(1),
        }
    }

    /// First set field that `kind` ignores.
    fn first_unsupported(&self, kind: AgentKind) -> Option<&'static str> {
        let set = [
            ("iterations", self.iterations.is_some()),
            ("exploration", self.exploration.is_some()),
            ("reward", self.reward.is_some()),
            ("workers", self.workers.is_some()),
            ("samples", self.samples.is_some()),
            ("simulations", self.simulations.is_some()),
            ("classifier", self.classifier.is_some()),
        ];
        let allowed: &[&str] = match kind {
            AgentKind::Random => &[],
            AgentKind::Heuristic => &["classifier"],
            AgentKind::Minimax => &["samples"],
            AgentKind::Mcts => &["iterations", "exploration", "reward", "workers", "classifier"],
            AgentKind::FlatMonteCarlo => &["simulations"],
        };
        set.iter()
            .find(|(param, present)| *present && !allowed.contains(param))
            .map(|(param, _)| *param)
    }
}

/// Everything needed to spawn a fresh policy for one seat of one game.
pub(crate) struct AgentBlueprint {
    pub(crate) name: String,
    pub(crate) kind: AgentKind,
    params: SearchParams,
    classifier: Option<Arc<dyn TrumpClassifier>>,
}

impl AgentBlueprint {
    pub(crate) fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        let base = SearchParams::from_env();
        configs
            .iter()
            .map(|config| Self::from_config(config, base))
            .collect()
    }

    fn from_config(config: &AgentConfig, base: SearchParams) -> Result<Self, AgentError> {
        let options = AgentParams::from_value(&config.name, &config.params)?;
        if let Some(param) = options.first_unsupported(config.kind) {
            return Err(AgentError::UnsupportedParam {
                name: config.name.clone(),
                kind: config.kind,
                param,
            });
        }

        let classifier = options
            .classifier
            .as_ref()
            .and_then(|path| load_classifier(&config.name, path));

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            params: options.search_params(base),
            classifier,
        })
    }

    pub(crate) fn spawn_policy(&self, seed: u64) -> Box<dyn Policy> {
        match self.kind {
            AgentKind::Random => Box::new(RandomPolicy::new(seed)),
            AgentKind::Heuristic => match &self.classifier {
                Some(classifier) => Box::new(HeuristicPolicy::with_classifier(classifier.clone())),
                None => Box::new(HeuristicPolicy::new()),
            },
            AgentKind::Minimax => Box::new(MinimaxPolicy::from_params(&self.params, seed)),
            AgentKind::Mcts => {
                let policy = MctsPolicy::from_params(&self.params, seed);
                match &self.classifier {
                    Some(classifier) => Box::new(policy.with_classifier(classifier.clone())),
                    None => Box::new(policy),
                }
            }
            AgentKind::FlatMonteCarlo => {
                Box::new(FlatMonteCarloPolicy::from_params(&self.params, seed))
            }
        }
    }
}

fn load_classifier(agent: &str, path: &Path) -> Option<Arc<dyn TrumpClassifier>> {
    match MlpTrumpClassifier::from_file(path) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(err) => {
            warn!(
                target: "jass_bench::agents",
                agent,
                path = %path.display(),
                error = %err,
                "classifier unavailable; falling back to score tables"
            );
            None
        }
    }
}
