//! Ordered attempt history for a session.

use serde::{Deserialize, Serialize};

use crate::model::{Attempt, DifficultyLevel};

/// One attempt as handed to trace sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub question_index: u32,
    pub level: DifficultyLevel,
    pub points_awarded: u32,
    pub cumulative_score: u32,
    pub correct: bool,
}

impl From<&Attempt> for TraceRecord {
    fn from(attempt: &Attempt) -> Self {
        Self {
            question_index: attempt.index,
            level: attempt.level,
            points_awarded: attempt.points_awarded,
            cumulative_score: attempt.cumulative_score,
            correct: attempt.correct,
        }
    }
}

/// Append-only list of attempts. Index and running score are derived here,
/// so callers cannot record an inconsistent attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    attempts: Vec<Attempt>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the next attempt and return it.
    pub fn record(&mut self, level: DifficultyLevel, correct: bool) -> &Attempt {
        let points_awarded = if correct { level.points() } else { 0 };
        let attempt = Attempt {
            index: self.attempts.len() as u32 + 1,
            level,
            correct,
            points_awarded,
            cumulative_score: self.cumulative_score() + points_awarded,
        };
        self.attempts.push(attempt);
        &self.attempts[self.attempts.len() - 1]
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn last(&self) -> Option<&Attempt> {
        self.attempts.last()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn cumulative_score(&self) -> u32 {
        self.attempts.last().map_or(0, |a| a.cumulative_score)
    }

    /// Records for a trace sink, in step order.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.attempts.iter().map(TraceRecord::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_derives_index_and_running_total() {
        let mut trace = Trace::new();
        trace.record(DifficultyLevel::One, true);
        trace.record(DifficultyLevel::Two, false);
        let last = *trace.record(DifficultyLevel::Four, true);

        assert_eq!(last.index, 3);
        assert_eq!(last.points_awarded, 20);
        assert_eq!(last.cumulative_score, 25);
        assert_eq!(trace.attempts()[1].points_awarded, 0);
        assert_eq!(trace.attempts()[1].cumulative_score, 5);
        assert_eq!(trace.cumulative_score(), 25);
        assert_eq!(trace.last(), Some(&last));
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn empty_trace() {
        let trace = Trace::new();
        assert!(trace.is_empty());
        assert!(trace.last().is_none());
        assert_eq!(trace.cumulative_score(), 0);
        assert!(trace.records().is_empty());
    }

    #[test]
    fn records_mirror_attempts() {
        let mut trace = Trace::new();
        trace.record(DifficultyLevel::Three, true);
        let records = trace.records();
        assert_eq!(
            records,
            vec![TraceRecord {
                question_index: 1,
                level: DifficultyLevel::Three,
                points_awarded: 15,
                cumulative_score: 15,
                correct: true,
            }]
        );
    }
}
