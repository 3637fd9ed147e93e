use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::arena::{DecisionSummary, GameOutcome, game_id};
use crate::config::{AgentConfig, AgentKind, ArenaConfig};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in arena results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing for game {1}")]
    MissingBaselineGame(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
    cheating: bool,
}

impl AnalyticsCollector {
    pub fn new(config: &ArenaConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .baseline()
            .map(str::to_string)
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.clone(), config.metrics.latency_budget_ms),
            );
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
            cheating: config.games.cheating,
        })
    }

    pub fn record_game(
        &mut self,
        game_index: usize,
        rotation_index: usize,
        outcome: &GameOutcome,
    ) -> Result<(), AnalyticsError> {
        let baseline_diff = outcome
            .seat_results
            .iter()
            .find(|seat| seat.agent_name == self.baseline)
            .map(|seat| seat.differential() as f64)
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineGame(
                    self.baseline.clone(),
                    game_id(game_index, rotation_index),
                )
            })?;

        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;

            let declared = outcome.declarer == Some(seat.seat);
            let pushed = outcome.pushed
                && outcome.declarer.map(|declarer| declarer.opposite()) == Some(seat.seat);
            acc.record_game(
                f64::from(seat.points),
                seat.differential() as f64,
                seat.points > seat.opponent_points,
                declared,
                pushed,
                &seat.metrics,
            );
        }

        for seat in &outcome.seat_results {
            if seat.agent_name == self.baseline {
                continue;
            }
            let diff = seat.differential() as f64 - baseline_diff;
            self.comparisons
                .entry(seat.agent_name.clone())
                .or_insert_with(ComparisonAccumulator::new)
                .record(diff);
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            if report.name == self.baseline {
                comparisons.push(ComparisonReport {
                    agent: report.name.clone(),
                    p_value: 1.0,
                    sample_size: report.games,
                });
                continue;
            }
            let (p_value, sample_size) = self
                .comparisons
                .remove(&report.name)
                .map(ComparisonAccumulator::wilcoxon_signed_rank)
                .unwrap_or((1.0, 0));
            comparisons.push(ComparisonReport {
                agent: report.name.clone(),
                p_value,
                sample_size,
            });
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
            latency_budget_ms: self.latency_budget_ms,
            cheating: self.cheating,
        }
        .enrich())
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    total_points: f64,
    total_differential: f64,
    games: u32,
    wins: u32,
    declarations: u32,
    pushes: u32,
    per_game_points: Vec<f64>,
    total_latency_ms: f64,
    total_decisions: u64,
    latency_budget_ms: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig, latency_budget_ms: u64) -> Self {
        Self {
            config,
            total_points: 0.0,
            total_differential: 0.0,
            games: 0,
            wins: 0,
            declarations: 0,
            pushes: 0,
            per_game_points: Vec::new(),
            total_latency_ms: 0.0,
            total_decisions: 0,
            latency_budget_ms,
        }
    }

    fn record_game(
        &mut self,
        points: f64,
        differential: f64,
        is_winner: bool,
        declared: bool,
        pushed: bool,
        metrics: &DecisionSummary,
    ) {
        self.total_points += points;
        self.total_differential += differential;
        self.games += 1;
        self.per_game_points.push(points);
        if is_winner {
            self.wins += 1;
        }
        if declared {
            self.declarations += 1;
        }
        if pushed {
            self.pushes += 1;
        }
        self.total_latency_ms += metrics.total_ms;
        self.total_decisions += u64::from(metrics.decisions);
    }

    fn into_report(self) -> AgentReport {
        let (avg_points, avg_differential) = if self.games == 0 {
            (0.0, 0.0)
        } else {
            let games = f64::from(self.games);
            (self.total_points / games, self.total_differential / games)
        };

        let avg_latency = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };

        AgentReport {
            ci95: confidence_interval(&self.per_game_points),
            name: self.config.name,
            kind: self.config.kind,
            params: self.config.params,
            games: self.games as usize,
            avg_points,
            avg_differential,
            wins: self.wins as usize,
            declarations: self.declarations as usize,
            pushes: self.pushes as usize,
            average_ms_per_decision: avg_latency,
            delta_vs_baseline: 0.0,
            over_budget: avg_latency > self.latency_budget_ms as f64,
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided Wilcoxon signed-rank test against a zero median, using the
    /// normal approximation with tie and continuity corrections. Teammates of
    /// the baseline contribute zero differences and drop out.
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for entry in &paired[i..=j] {
                ranks.push((rank, entry.1));
            }
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let z = ((w - mean_w).abs() - 0.5) / variance_w.sqrt();
        let p = Normal::new(0.0, 1.0)
            .map(|normal| 2.0 * (1.0 - normal.cdf(z)))
            .unwrap_or(1.0);
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub latency_budget_ms: u64,
    pub cheating: bool,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_avg = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.avg_differential)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.avg_differential - baseline_avg;
        }

        self
    }

    pub fn p_value(&self, agent: &str) -> f64 {
        self.comparisons
            .iter()
            .find(|c| c.agent == agent)
            .map(|c| c.p_value)
            .unwrap_or(1.0)
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Arena Summary\n\n");
        rows.push_str(&format!(
            "Mode: {}. Baseline: {}. Latency budget: {} ms average per decision\n\n",
            if self.cheating { "cheating" } else { "fair" },
            self.baseline,
            self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Games | Avg points | Avg diff | Δ vs baseline | 95% CI | Win % | Declared | Pushed | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|-------|------|-------|------------|----------|----------------|--------|-------|----------|--------|------------------|-------------|---------|\n");

        for agent in &self.agents {
            let win_rate = if agent.games == 0 {
                0.0
            } else {
                agent.wins as f64 / agent.games as f64
            };

            rows.push_str(&format!(
                "| {name} | {kind} | {games} | {avg:.2} | {diff:+.2} | {delta:+.2} | [{ci_low:.2}, {ci_high:.2}] | {win:.1}% | {declared} | {pushed} | {latency:.2} | {over_budget} | {pval:.3} |\n",
                name = agent.name,
                kind = agent.kind.label(),
                games = agent.games,
                avg = agent.avg_points,
                diff = agent.avg_differential,
                delta = agent.delta_vs_baseline,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                win = win_rate * 100.0,
                declared = agent.declarations,
                pushed = agent.pushes,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
                pval = self.p_value(&agent.name),
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub games: usize,
    /// Mean points scored by the agent's team.
    pub avg_points: f64,
    /// Mean of own-team minus opposing-team points.
    pub avg_differential: f64,
    pub ci95: (f64, f64),
    pub wins: usize,
    pub declarations: usize,
    pub pushes: usize,
    pub average_ms_per_decision: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_interval_brackets_mean() {
        let (low, high) = confidence_interval(&[60.0, 80.0, 100.0, 120.0]);
        assert!(low < 90.0 && high > 90.0);
        assert!(((low + high) / 2.0 - 90.0).abs() < 1e-9);
        assert_eq!(confidence_interval(&[42.0]), (42.0, 42.0));
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
    }

    #[test]
    fn identical_results_have_no_signal() {
        let mut comp = ComparisonAccumulator::new();
        for _ in 0..10 {
            comp.record(0.0);
        }
        assert_eq!(comp.wilcoxon_signed_rank(), (1.0, 0));
    }

    #[test]
    fn consistent_advantage_is_significant() {
        let mut comp = ComparisonAccumulator::new();
        for diff in 1..=20 {
            comp.record(f64::from(diff) * 4.0);
        }
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!(n, 20);
        assert!(p < 0.01, "p = {p}");
    }

    #[test]
    fn balanced_differences_are_not_significant() {
        let mut comp = ComparisonAccumulator::new();
        for diff in [10.0, -10.0, 22.0, -22.0, 5.0, -5.0, 40.0, -40.0] {
            comp.record(diff);
        }
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!(n, 8);
        assert!(p > 0.5, "p = {p}");
    }
}
