//! Session and cohort reports with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::AdaptiveEngine;
use crate::model::{LevelPolicy, OracleMode, TerminationReason};
use crate::statistics::CohortStats;
use crate::trace::TraceRecord;

/// Everything a trace sink needs to render one finished (or aborted) session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Student id or other caller-chosen label.
    #[serde(default)]
    pub label: Option<String>,
    pub mode: OracleMode,
    pub policy: LevelPolicy,
    pub seed: u64,
    pub target_score: u32,
    pub max_questions: u32,
    #[serde(default)]
    pub ability_estimate: Option<f64>,
    /// Attempts in step order.
    pub attempts: Vec<TraceRecord>,
    pub final_score: u32,
    pub questions_asked: u32,
    /// `None` if the session was abandoned before terminating.
    #[serde(default)]
    pub termination_reason: Option<TerminationReason>,
}

impl SessionReport {
    /// Snapshot an engine's session.
    pub fn from_engine(engine: &AdaptiveEngine, mode: OracleMode, label: Option<String>) -> Self {
        let session = engine.session();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            label,
            mode,
            policy: engine.policy(),
            seed: engine.seed(),
            target_score: session.target_score(),
            max_questions: session.max_questions(),
            ability_estimate: session.ability_estimate(),
            attempts: session.trace().records(),
            final_score: session.score(),
            questions_asked: session.attempts().len() as u32,
            termination_reason: session.termination_reason(),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse session report JSON")
    }

    /// One-line human summary.
    pub fn summary_line(&self) -> String {
        let outcome = self
            .termination_reason
            .map_or_else(|| "not finished".to_string(), |r| r.to_string());
        format!(
            "final score {} after {} question(s) ({outcome})",
            self.final_score, self.questions_asked
        )
    }
}

/// Results of running every student in a cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub cohort: CohortSummary,
    /// One report per student that ran, in cohort order.
    pub sessions: Vec<SessionReport>,
    pub stats: CohortStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a cohort (without the student definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSummary {
    pub id: String,
    pub name: String,
    pub student_count: usize,
}

impl CohortReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse cohort report JSON")
    }
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write report to {}", path.display()))?;
    Ok(())
}
