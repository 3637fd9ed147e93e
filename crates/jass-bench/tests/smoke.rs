use std::collections::HashSet;
use std::fs;

use jass_bench::arena::ArenaRunner;
use jass_bench::config::ArenaConfig;
use tempfile::tempdir;

fn load_config(output_dir: &std::path::Path, cheating: bool) -> ArenaConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
games:
  seed: 4242
  count: 2
  cheating: {cheating}
  swap_sides: true
agents:
  - name: "mcts"
    kind: "mcts"
    params:
      iterations: 16
      workers: 1
  - name: "baseline"
    kind: "heuristic"
  - name: "minimax"
    kind: "minimax"
    params:
      samples: 2
  - name: "flat"
    kind: "flat_monte_carlo"
    params:
      simulations: 2
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
metrics:
  baseline: "baseline"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("games.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
    );

    let mut cfg: ArenaConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn read_rows(path: &std::path::Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("jsonl readable")
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect()
}

#[test]
fn arena_smoke_test_distributes_all_points() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), false);
    let outputs = config.resolved_outputs();

    let runner = ArenaRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("arena completes");

    assert_eq!(summary.games_played, 2);
    assert_eq!(summary.rotations, 2);
    assert_eq!(summary.rows_written, 2 * 2 * 4);
    assert!(summary.telemetry_path.is_none());

    let rows = read_rows(&summary.jsonl_path);
    assert_eq!(rows.len(), summary.rows_written);

    let mut game_ids = HashSet::new();
    for row in &rows {
        let points = row["points"].as_u64().expect("points");
        let opponent = row["opponent_points"].as_u64().expect("opponent points");
        assert_eq!(points + opponent, 157, "row {row}");
        assert_eq!(
            row["differential"].as_i64(),
            Some(points as i64 - opponent as i64)
        );
        assert_eq!(row["cheating"], serde_json::Value::Bool(false));
        assert!(row["trump"].is_string(), "trump missing in {row}");
        // 9 cards, plus a trump answer for the forehand or its partner
        assert!(row["decisions"].as_u64().expect("decisions") >= 9);
        game_ids.insert(row["game_id"].as_str().expect("game id").to_string());
    }
    assert_eq!(game_ids.len(), 4);

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    assert!(markdown.contains("| baseline | heuristic |"));
    assert!(markdown.contains("| flat | flat_monte_carlo |"));
}

#[test]
fn swapped_seating_moves_every_agent_to_the_other_team() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), false);
    let outputs = config.resolved_outputs();
    let summary = ArenaRunner::new(config, outputs)
        .expect("runner created")
        .run()
        .expect("arena completes");

    let rows = read_rows(&summary.jsonl_path);
    for agent in ["mcts", "baseline", "minimax", "flat"] {
        let teams: HashSet<String> = rows
            .iter()
            .filter(|row| row["game_index"] == 0 && row["bot"] == agent)
            .map(|row| row["team"].as_str().expect("team").to_string())
            .collect();
        assert_eq!(teams.len(), 2, "{agent} played for one team only");
    }
}

#[test]
fn cheating_runs_are_reproducible() {
    let first = tempdir().expect("temp dir");
    let second = tempdir().expect("temp dir");

    let mut totals = Vec::new();
    for dir in [&first, &second] {
        let config = load_config(dir.path(), true);
        let outputs = config.resolved_outputs();
        let summary = ArenaRunner::new(config, outputs)
            .expect("runner created")
            .run()
            .expect("arena completes");
        let rows = read_rows(&summary.jsonl_path);
        assert!(rows.iter().all(|row| row["cheating"] == true));
        totals.push(
            rows.iter()
                .map(|row| {
                    (
                        row["game_id"].as_str().unwrap_or_default().to_string(),
                        row["seat"].as_str().unwrap_or_default().to_string(),
                        row["points"].as_u64(),
                        row["trump"].clone(),
                    )
                })
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(totals[0], totals[1]);
}
