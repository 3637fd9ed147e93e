use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_LATENCY_BUDGET_MS: u64 = 1_200;
const SEATS_PER_TABLE: usize = 4;

/// Root arena configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ArenaConfig {
    pub run_id: String,
    pub games: GamesConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArenaConfig {
    /// Reads, parses and validates a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            source,
            path: path.clone(),
        })?;
        let mut cfg: ArenaConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                source,
                path: path.clone(),
            })?;
        cfg.validate()
            .map_err(|source| ConfigError::Invalid { path, source })?;
        Ok(cfg)
    }

    /// Checks every block in place; null agent params become empty mappings.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_name("run_id", &self.run_id)?;
        if self.games.count == 0 {
            return Err(ValidationError::invalid(
                "games.count",
                "number of games must be greater than zero",
            ));
        }
        for (field, template) in [
            ("outputs.jsonl", &self.outputs.jsonl),
            ("outputs.summary_md", &self.outputs.summary_md),
        ] {
            if template.trim().is_empty() {
                return Err(ValidationError::invalid(field, "path must not be empty"));
            }
        }
        validate_agents(&mut self.agents)?;
        self.metrics.validate(&self.agents)?;
        if self.logging.tracing_level.trim().is_empty() {
            self.logging.tracing_level = default_tracing_level();
        }
        Ok(())
    }

    /// Output paths with `{run_id}` substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let resolve = |template: &str| PathBuf::from(template.replace("{run_id}", &self.run_id));
        ResolvedOutputs {
            jsonl: resolve(&self.outputs.jsonl),
            summary_md: resolve(&self.outputs.summary_md),
        }
    }

    /// The agent every other agent is compared against. Falls back to the
    /// agent seated North when no baseline is named.
    pub fn baseline(&self) -> Option<&str> {
        self.metrics
            .baseline
            .as_deref()
            .or_else(|| self.agents.first().map(|agent| agent.name.as_str()))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub count: usize,
    /// Hand every agent the full deal instead of its own observation.
    #[serde(default)]
    pub cheating: bool,
    /// Replay each deal with the agents rotated one seat so both teams see
    /// both sets of cards.
    #[serde(default)]
    pub swap_sides: bool,
}

impl GamesConfig {
    pub fn rotations(&self) -> usize {
        if self.swap_sides { 2 } else { 1 }
    }
}

/// One arena participant. Agents are seated North, East, South, West in
/// list order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Random,
    Heuristic,
    Minimax,
    Mcts,
    FlatMonteCarlo,
}

impl AgentKind {
    pub fn label(self) -> &'static str {
        match self {
            AgentKind::Random => "random",
            AgentKind::Heuristic => "heuristic",
            AgentKind::Minimax => "minimax",
            AgentKind::Mcts => "mcts",
            AgentKind::FlatMonteCarlo => "flat_monte_carlo",
        }
    }
}

/// Path templates; `{run_id}` is replaced on resolve.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self, agents: &[AgentConfig]) -> Result<(), ValidationError> {
        if let Some(baseline) = self.baseline.as_deref() {
            if !agents.iter().any(|agent| agent.name == baseline) {
                return Err(ValidationError::invalid(
                    "metrics.baseline",
                    format!("baseline agent '{baseline}' is not seated"),
                ));
            }
        }
        if self.latency_budget_ms == 0 {
            return Err(ValidationError::invalid(
                "metrics.latency_budget_ms",
                "latency budget must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn default_latency_budget_ms() -> u64 {
    DEFAULT_LATENCY_BUDGET_MS
}

/// Structured telemetry is off unless asked for.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    /// `None` when the configured level is not a `tracing` level name.
    pub fn level(&self) -> Option<Level> {
        self.tracing_level.trim().parse().ok()
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

/// Run ids and agent names end up in paths and table rows.
fn check_name(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::invalid(field, "must not be empty"));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if !value.chars().all(allowed) {
        return Err(ValidationError::invalid(
            field,
            format!("'{value}' may only contain ASCII letters, digits, '.', '_' or '-'"),
        ));
    }
    Ok(())
}

fn validate_agents(agents: &mut [AgentConfig]) -> Result<(), ValidationError> {
    if agents.len() != SEATS_PER_TABLE {
        return Err(ValidationError::invalid(
            "agents",
            format!(
                "exactly {SEATS_PER_TABLE} agents are required, found {}",
                agents.len()
            ),
        ));
    }

    let mut seen = HashSet::new();
    for agent in agents.iter_mut() {
        check_name("agents.name", &agent.name)?;
        if !seen.insert(agent.name.clone()) {
            return Err(ValidationError::invalid(
                "agents",
                format!("agent '{}' is seated twice", agent.name),
            ));
        }
        if agent.params.is_null() {
            agent.params = serde_yaml::Value::Mapping(Default::default());
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "arena_smoke"
games:
  seed: 123
  count: 16
agents:
  - name: "mcts_north"
    kind: "mcts"
    params:
      iterations: 64
  - name: "heuristic_east"
    kind: "heuristic"
  - name: "mcts_south"
    kind: "mcts"
  - name: "random_west"
    kind: "random"
outputs:
  jsonl: "bench/out/{run_id}/games.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
metrics:
  baseline: "heuristic_east"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: ArenaConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.metrics.latency_budget_ms, DEFAULT_LATENCY_BUDGET_MS);
        assert!(cfg.logging.enable_structured);
        assert!(!cfg.games.cheating);
        assert_eq!(cfg.games.rotations(), 1);
        assert_eq!(cfg.agents[2].kind, AgentKind::Mcts);
        assert!(cfg.agents[1].params.is_mapping());

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("bench/out/arena_smoke/games.jsonl")
        );
    }

    #[test]
    fn from_path_reads_and_validates() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("arena.yaml");
        fs::write(&path, BASIC_YAML.replace("\"debug\"", "\"WARN\"")).expect("write");

        let cfg = ArenaConfig::from_path(&path).expect("load");
        assert_eq!(cfg.logging.level(), Some(Level::WARN));

        let missing = ArenaConfig::from_path(dir.path().join("absent.yaml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        fs::write(&path, BASIC_YAML.replace("count: 16", "count: 0")).expect("write");
        assert!(matches!(
            ArenaConfig::from_path(&path),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn baseline_defaults_to_north() {
        let yaml = BASIC_YAML.replace(
            "  baseline: \"heuristic_east\"\n",
            "  latency_budget_ms: 900\n",
        );
        let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.baseline(), Some("mcts_north"));
        assert_eq!(cfg.metrics.latency_budget_ms, 900);
    }

    #[test]
    fn rejects_unknown_baseline() {
        let yaml = BASIC_YAML.replace("baseline: \"heuristic_east\"", "baseline: \"nobody\"");
        let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "metrics.baseline"
        ));
    }

    #[test]
    fn rejects_duplicate_agents() {
        let yaml = BASIC_YAML.replace("random_west", "mcts_north");
        let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("duplicate agents should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "agents"
        ));
    }

    #[test]
    fn rejects_short_table() {
        let yaml = BASIC_YAML.replace("  - name: \"random_west\"\n    kind: \"random\"\n", "");
        let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("three agents should fail");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, message }
                if field == "agents" && message.contains("found 3")
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("arena_smoke", "arena smoke");
        let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn rejects_zero_games() {
        let yaml = BASIC_YAML.replace("count: 16", "count: 0");
        let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("zero games");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "games.count"
        ));
    }

    #[test]
    fn swap_sides_doubles_rotations() {
        let yaml = BASIC_YAML.replace(
            "count: 16",
            "count: 16\n  swap_sides: true\n  cheating: true",
        );
        let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert!(cfg.games.cheating);
        assert_eq!(cfg.games.rotations(), 2);
    }
}
