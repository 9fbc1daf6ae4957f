//! Graphviz DOT renderers for session traces.
//!
//! Output is plain DOT text; turning it into an image is left to `dot -Tpng`.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use adaptest_core::engine::CALIBRATION_LEVELS;
use adaptest_core::report::SessionReport;

const CORRECT_FILL: &str = "lightgreen";
const INCORRECT_FILL: &str = "lightcoral";
const TERMINAL_FILL: &str = "lightblue";

/// Escape a string for use inside a double-quoted DOT identifier.
fn dot_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render the question path of one session.
///
/// `start -> Q1 -> ... -> Qn -> end`, each question colored by correctness
/// and the end node labeled with the final score.
pub fn path_dot(report: &SessionReport) -> String {
    let mut out = String::new();
    let title = report.label.as_deref().unwrap_or("session");

    let _ = writeln!(out, "digraph \"{}\" {{", dot_escape(title));
    out.push_str("  rankdir=TB;\n");
    let _ = writeln!(
        out,
        "  start [label=\"Start\", shape=ellipse, style=filled, fillcolor={TERMINAL_FILL}];"
    );

    let mut previous = "start".to_string();
    for record in &report.attempts {
        let id = format!("Q{}", record.question_index);
        let fill = if record.correct {
            CORRECT_FILL
        } else {
            INCORRECT_FILL
        };
        let _ = writeln!(
            out,
            "  {id} [label=\"Question {}\\nLevel {}\\nPoints: {}\", shape=box, style=filled, fillcolor={fill}];",
            record.question_index, record.level, record.points_awarded
        );
        let _ = writeln!(out, "  {previous} -> {id};");
        previous = id;
    }

    let _ = writeln!(
        out,
        "  end [label=\"End\\nTotal score: {}\", shape=ellipse, style=filled, fillcolor={TERMINAL_FILL}];",
        report.final_score
    );
    let _ = writeln!(out, "  {previous} -> end;");
    out.push_str("}\n");
    out
}

/// Render the full calibration decision tree with this session's route
/// through it highlighted.
///
/// Every calibration question branches on correct/incorrect, giving
/// 1 + 2 + 4 + 8 question nodes. Node labels show the score accumulated on
/// the way in against the maximum reachable at that depth.
pub fn calibration_tree_dot(report: &SessionReport) -> String {
    let taken: Vec<bool> = report
        .attempts
        .iter()
        .take(CALIBRATION_LEVELS.len())
        .map(|r| r.correct)
        .collect();

    let mut out = String::new();
    out.push_str("digraph calibration {\n");
    out.push_str("  rankdir=TB;\n");
    out.push_str("  node [shape=box, style=filled];\n");

    let mut max_before = 0;
    for (depth, level) in CALIBRATION_LEVELS.iter().enumerate() {
        for branch in 0..(1u32 << depth) {
            let answers = branch_answers(branch, depth);
            let id = node_id(depth, branch);
            let earned: u32 = answers
                .iter()
                .zip(CALIBRATION_LEVELS.iter())
                .filter(|(correct, _)| **correct)
                .map(|(_, l)| l.points())
                .sum();
            let on_path = taken.len() > depth && taken[..depth] == answers[..];
            let emphasis = if on_path { ", penwidth=2" } else { "" };
            let _ = writeln!(
                out,
                "  {id} [label=\"Q{} (level {level})\\n{earned}/{max_before}\", fillcolor={}{emphasis}];",
                depth + 1,
                depth_fill(depth),
            );

            if depth + 1 < CALIBRATION_LEVELS.len() {
                for correct in [true, false] {
                    let child = node_id(depth + 1, (branch << 1) | u32::from(correct));
                    let label = if correct {
                        format!("correct (+{})", level.points())
                    } else {
                        "incorrect (0)".to_string()
                    };
                    let followed = on_path && taken.get(depth) == Some(&correct);
                    let style = if followed {
                        "style=bold, color=black, penwidth=2"
                    } else {
                        "style=dashed, color=gray"
                    };
                    let _ = writeln!(out, "  {id} -> {child} [label=\"{label}\", {style}];");
                }
            }
        }
        max_before += level.points();
    }

    out.push_str("}\n");
    out
}

fn node_id(depth: usize, branch: u32) -> String {
    format!("Q{}_{branch}", depth + 1)
}

/// Answers that lead to `branch` at `depth`, oldest first.
fn branch_answers(branch: u32, depth: usize) -> Vec<bool> {
    (0..depth)
        .rev()
        .map(|shift| (branch >> shift) & 1 == 1)
        .collect()
}

fn depth_fill(depth: usize) -> &'static str {
    match depth {
        0 => "white",
        1 => "lightblue",
        2 => "lightgreen",
        _ => "lightcoral",
    }
}

/// Write DOT text to a file, creating parent directories.
pub fn write_dot(dot: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, dot).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::model::{DifficultyLevel, LevelPolicy, OracleMode, TerminationReason};
    use adaptest_core::trace::TraceRecord;

    fn report(answers: &[(DifficultyLevel, bool)]) -> SessionReport {
        let mut score = 0;
        let attempts = answers
            .iter()
            .enumerate()
            .map(|(i, (level, correct))| {
                let points = if *correct { level.points() } else { 0 };
                score += points;
                TraceRecord {
                    question_index: i as u32 + 1,
                    level: *level,
                    points_awarded: points,
                    cumulative_score: score,
                    correct: *correct,
                }
            })
            .collect::<Vec<_>>();
        SessionReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            label: Some("alice".into()),
            mode: OracleMode::Simulated,
            policy: LevelPolicy::Deterministic,
            seed: 1,
            target_score: 100,
            max_questions: 10,
            ability_estimate: Some(70.0),
            questions_asked: attempts.len() as u32,
            attempts,
            final_score: score,
            termination_reason: Some(TerminationReason::MaxQuestionsReached),
        }
    }

    #[test]
    fn path_chains_every_question() {
        use DifficultyLevel::*;
        let dot = path_dot(&report(&[(One, true), (Two, false), (Three, true)]));

        assert!(dot.starts_with("digraph \"alice\" {"));
        assert!(dot.contains("start -> Q1;"));
        assert!(dot.contains("Q1 -> Q2;"));
        assert!(dot.contains("Q2 -> Q3;"));
        assert!(dot.contains("Q3 -> end;"));
        assert!(dot.contains("Total score: 20"));
        assert!(dot.contains("Level 2\\nPoints: 0\", shape=box, style=filled, fillcolor=lightcoral"));
        assert!(dot.contains("Level 3\\nPoints: 15\", shape=box, style=filled, fillcolor=lightgreen"));
    }

    #[test]
    fn empty_path_goes_straight_to_end() {
        let dot = path_dot(&report(&[]));
        assert!(dot.contains("start -> end;"));
        assert!(dot.contains("Total score: 0"));
    }

    #[test]
    fn calibration_tree_has_fifteen_questions() {
        use DifficultyLevel::*;
        let dot = calibration_tree_dot(&report(&[(One, true), (Two, false), (Three, true), (Four, true)]));

        let nodes = dot.lines().filter(|l| l.contains("[label=\"Q")).count();
        let edges = dot.lines().filter(|l| l.contains(" -> ")).count();
        assert_eq!(nodes, 15);
        assert_eq!(edges, 14);
    }

    #[test]
    fn calibration_tree_highlights_taken_route() {
        use DifficultyLevel::*;
        let dot = calibration_tree_dot(&report(&[(One, true), (Two, false), (Three, true), (Four, true)]));

        let bold: Vec<&str> = dot.lines().filter(|l| l.contains("style=bold")).collect();
        assert_eq!(bold.len(), 3);
        assert!(bold[0].contains("Q1_0 -> Q2_1"));
        assert!(bold[1].contains("Q2_1 -> Q3_2"));
        assert!(bold[2].contains("Q3_2 -> Q4_5"));
        // Route node Q4_5 was reached with 5 + 15 = 20 of 30.
        assert!(dot.contains("Q4_5 [label=\"Q4 (level 4)\\n20/30\", fillcolor=lightcoral, penwidth=2]"));
    }

    #[test]
    fn write_dot_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/path.dot");
        write_dot("digraph {}\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "digraph {}\n");
    }
}
