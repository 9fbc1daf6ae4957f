//! Aggregate statistics across the sessions of a cohort.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{DifficultyLevel, TerminationReason};
use crate::report::SessionReport;

/// Aggregate statistics for a cohort run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub sessions: usize,
    pub mean_final_score: f64,
    pub mean_questions: f64,
    /// Fraction of sessions that ended by reaching the target.
    pub target_reached_rate: f64,
    /// Keyed by level number.
    pub per_level: BTreeMap<u8, LevelStats>,
}

/// How often a level was asked and answered correctly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelStats {
    pub asked: u32,
    pub correct: u32,
    pub accuracy: f64,
}

/// Compute aggregate statistics from finished sessions.
pub fn compute_cohort_stats(sessions: &[SessionReport]) -> CohortStats {
    if sessions.is_empty() {
        return CohortStats::default();
    }
    let n = sessions.len() as f64;

    let mean_final_score = sessions.iter().map(|s| f64::from(s.final_score)).sum::<f64>() / n;
    let mean_questions = sessions
        .iter()
        .map(|s| f64::from(s.questions_asked))
        .sum::<f64>()
        / n;
    let target_reached_rate = sessions
        .iter()
        .filter(|s| s.termination_reason == Some(TerminationReason::TargetReached))
        .count() as f64
        / n;

    let mut per_level: BTreeMap<u8, LevelStats> = DifficultyLevel::ALL
        .iter()
        .map(|l| (l.number(), LevelStats::default()))
        .collect();
    for record in sessions.iter().flat_map(|s| &s.attempts) {
        let entry = per_level.entry(record.level.number()).or_default();
        entry.asked += 1;
        if record.correct {
            entry.correct += 1;
        }
    }
    for stats in per_level.values_mut() {
        stats.accuracy = if stats.asked == 0 {
            0.0
        } else {
            f64::from(stats.correct) / f64::from(stats.asked)
        };
    }

    CohortStats {
        sessions: sessions.len(),
        mean_final_score,
        mean_questions,
        target_reached_rate,
        per_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LevelPolicy, OracleMode};
    use crate::trace::TraceRecord;
    use chrono::Utc;
    use uuid::Uuid;

    fn record(index: u32, level: DifficultyLevel, correct: bool, total: u32) -> TraceRecord {
        TraceRecord {
            question_index: index,
            level,
            points_awarded: if correct { level.points() } else { 0 },
            cumulative_score: total,
            correct,
        }
    }

    fn report(attempts: Vec<TraceRecord>, reason: TerminationReason) -> SessionReport {
        SessionReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            label: None,
            mode: OracleMode::Simulated,
            policy: LevelPolicy::Deterministic,
            seed: 0,
            target_score: 100,
            max_questions: 10,
            ability_estimate: Some(50.0),
            final_score: attempts.last().map_or(0, |a| a.cumulative_score),
            questions_asked: attempts.len() as u32,
            attempts,
            termination_reason: Some(reason),
        }
    }

    #[test]
    fn empty_cohort_has_zero_stats() {
        let stats = compute_cohort_stats(&[]);
        assert_eq!(stats.sessions, 0);
        assert_eq!(stats.mean_final_score, 0.0);
    }

    #[test]
    fn aggregates_scores_and_levels() {
        let a = report(
            vec![
                record(1, DifficultyLevel::One, true, 5),
                record(2, DifficultyLevel::Two, false, 5),
            ],
            TerminationReason::MaxQuestionsReached,
        );
        let b = report(
            vec![
                record(1, DifficultyLevel::One, true, 5),
                record(2, DifficultyLevel::Two, true, 15),
                record(3, DifficultyLevel::Three, true, 30),
                record(4, DifficultyLevel::Four, true, 50),
            ],
            TerminationReason::TargetReached,
        );

        let stats = compute_cohort_stats(&[a, b]);
        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.mean_final_score, 27.5);
        assert_eq!(stats.mean_questions, 3.0);
        assert_eq!(stats.target_reached_rate, 0.5);
        assert_eq!(stats.per_level[&1].asked, 2);
        assert_eq!(stats.per_level[&1].accuracy, 1.0);
        assert_eq!(stats.per_level[&2].accuracy, 0.5);
        assert_eq!(stats.per_level[&4].correct, 1);
    }
}
