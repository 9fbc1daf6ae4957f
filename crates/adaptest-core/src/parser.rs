//! TOML cohort parser.
//!
//! Loads cohorts from TOML files and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    Cohort, LevelPolicy, OracleMode, SeedStrategy, SessionConfig, Student, StudentFeatures,
    DEFAULT_MAX_QUESTIONS, DEFAULT_TARGET_SCORE,
};

/// Intermediate TOML structure for parsing cohort files.
#[derive(Debug, Deserialize)]
struct TomlCohortFile {
    cohort: TomlCohortHeader,
    #[serde(default)]
    students: Vec<TomlStudent>,
}

#[derive(Debug, Deserialize)]
struct TomlCohortHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_target_score")]
    target_score: i64,
    #[serde(default = "default_max_questions")]
    max_questions: i64,
    #[serde(default = "default_policy_str")]
    policy: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    seed_strategy: SeedStrategy,
}

fn default_target_score() -> i64 {
    DEFAULT_TARGET_SCORE
}

fn default_max_questions() -> i64 {
    DEFAULT_MAX_QUESTIONS
}

fn default_policy_str() -> String {
    "deterministic".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlStudent {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ability: Option<f64>,
    #[serde(default)]
    features: Option<StudentFeatures>,
    #[serde(default)]
    seed: Option<u64>,
}

/// Parse a single TOML file into a `Cohort`.
pub fn parse_cohort(path: &Path) -> Result<Cohort> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cohort file: {}", path.display()))?;

    parse_cohort_str(&content, path)
}

/// Parse a TOML string into a `Cohort` (useful for testing).
pub fn parse_cohort_str(content: &str, source_path: &Path) -> Result<Cohort> {
    let parsed: TomlCohortFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let policy: LevelPolicy = parsed
        .cohort
        .policy
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let students = parsed
        .students
        .into_iter()
        .map(|s| Student {
            name: s.name.unwrap_or_else(|| s.id.clone()),
            id: s.id,
            ability: s.ability,
            features: s.features,
            seed: s.seed,
        })
        .collect();

    Ok(Cohort {
        id: parsed.cohort.id,
        name: parsed.cohort.name,
        description: parsed.cohort.description,
        session: SessionConfig {
            target_score: parsed.cohort.target_score,
            max_questions: parsed.cohort.max_questions,
            mode: OracleMode::Simulated,
            policy,
            seed: parsed.cohort.seed,
        },
        seed_strategy: parsed.cohort.seed_strategy,
        students,
    })
}

/// Load every `.toml` cohort in a directory, sorted by file name.
pub fn load_cohort_directory(dir: &Path) -> Result<Vec<Cohort>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    entries.sort();

    entries.iter().map(|p| parse_cohort(p)).collect()
}

/// A validation warning.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub student_id: Option<String>,
    pub message: String,
}

/// Validate a cohort and return any warnings.
pub fn validate_cohort(cohort: &Cohort) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |student_id: Option<&str>, message: String| {
        warnings.push(ValidationWarning {
            student_id: student_id.map(str::to_string),
            message,
        });
    };

    if cohort.session.target_score <= 0 {
        warn(
            None,
            format!("target_score must be positive, got {}", cohort.session.target_score),
        );
    }
    if cohort.session.max_questions <= 0 {
        warn(
            None,
            format!(
                "max_questions must be positive, got {}",
                cohort.session.max_questions
            ),
        );
    }
    if cohort.students.is_empty() {
        warn(None, "cohort has no students".into());
    }

    let mut seen = HashSet::new();
    for student in &cohort.students {
        let id = Some(student.id.as_str());
        if !seen.insert(student.id.as_str()) {
            warn(id, format!("duplicate student id '{}'", student.id));
        }
        match (student.ability, &student.features) {
            (None, None) => warn(id, "student has neither ability nor features".into()),
            (Some(_), Some(_)) => warn(id, "both ability and features set; features are ignored".into()),
            _ => {}
        }
        if let Some(ability) = student.ability {
            if !(0.0..=100.0).contains(&ability) {
                warn(id, format!("ability {ability} is outside 0-100 and will be clamped"));
            }
        }
        if let Some(f) = &student.features {
            let binary = [
                ("gender", f.gender),
                ("parent_education", f.parent_education),
                ("first_child", f.first_child),
                ("working", f.working),
            ];
            for (name, value) in binary {
                if value > 1 {
                    warn(id, format!("{name} should be 0 or 1, got {value}"));
                }
            }
            if f.parent_income > 2 {
                warn(
                    id,
                    format!("parent_income should be 0, 1 or 2, got {}", f.parent_income),
                );
            }
        }
    }

    warnings
}
