//! Core data model types for adaptest.
//!
//! These are the fundamental types the rest of the workspace uses to describe
//! difficulty levels, attempts, session settings, and student cohorts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Points awarded for a correct answer, indexed by `level - 1`.
pub const POINTS: [u32; 4] = [5, 10, 15, 20];

/// Default score that ends a session.
pub const DEFAULT_TARGET_SCORE: i64 = 100;

/// Default question ceiling.
pub const DEFAULT_MAX_QUESTIONS: i64 = 10;

/// Item difficulty. Only the four defined levels are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DifficultyLevel {
    One,
    Two,
    Three,
    Four,
}

impl DifficultyLevel {
    /// All levels in ascending order.
    pub const ALL: [DifficultyLevel; 4] = [
        DifficultyLevel::One,
        DifficultyLevel::Two,
        DifficultyLevel::Three,
        DifficultyLevel::Four,
    ];

    /// Numeric level, 1 through 4.
    pub fn number(self) -> u8 {
        match self {
            DifficultyLevel::One => 1,
            DifficultyLevel::Two => 2,
            DifficultyLevel::Three => 3,
            DifficultyLevel::Four => 4,
        }
    }

    /// Points awarded for a correct answer at this level.
    pub fn points(self) -> u32 {
        POINTS[usize::from(self.number() - 1)]
    }

    /// Minimum ability a simulated student needs to ever answer this level.
    pub fn ability_threshold(self) -> f64 {
        f64::from(self.number()) * 20.0
    }
}

impl TryFrom<u8> for DifficultyLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DifficultyLevel::One),
            2 => Ok(DifficultyLevel::Two),
            3 => Ok(DifficultyLevel::Three),
            4 => Ok(DifficultyLevel::Four),
            other => Err(format!("difficulty level must be 1-4, got {other}")),
        }
    }
}

impl From<DifficultyLevel> for u8 {
    fn from(level: DifficultyLevel) -> Self {
        level.number()
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// One recorded question interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based position in the session.
    pub index: u32,
    pub level: DifficultyLevel,
    pub correct: bool,
    pub points_awarded: u32,
    /// Running total including this attempt.
    pub cumulative_score: u32,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    TargetReached,
    MaxQuestionsReached,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::TargetReached => write!(f, "target reached"),
            TerminationReason::MaxQuestionsReached => write!(f, "max questions reached"),
        }
    }
}

/// How the adaptive phase picks the next level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelPolicy {
    /// Fixed score bands; level 2 is never chosen.
    #[default]
    Deterministic,
    /// Score bands with a 70/30 draw between a primary and secondary level.
    Weighted,
}

impl fmt::Display for LevelPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelPolicy::Deterministic => write!(f, "deterministic"),
            LevelPolicy::Weighted => write!(f, "weighted"),
        }
    }
}

impl FromStr for LevelPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deterministic" | "fixed" => Ok(LevelPolicy::Deterministic),
            "weighted" | "random" => Ok(LevelPolicy::Weighted),
            other => Err(format!("unknown level policy: {other}")),
        }
    }
}

/// Where correctness comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleMode {
    /// Answers are read from an external channel.
    Interactive,
    /// Answers are simulated from an ability estimate.
    #[default]
    Simulated,
}

impl fmt::Display for OracleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleMode::Interactive => write!(f, "interactive"),
            OracleMode::Simulated => write!(f, "simulated"),
        }
    }
}

impl FromStr for OracleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "interactive" => Ok(OracleMode::Interactive),
            "simulated" | "sim" => Ok(OracleMode::Simulated),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Settings for a single session.
///
/// Bounds are signed so that out-of-range input reaches validation instead of
/// failing earlier in parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_target_score")]
    pub target_score: i64,
    #[serde(default = "default_max_questions")]
    pub max_questions: i64,
    #[serde(default)]
    pub mode: OracleMode,
    #[serde(default)]
    pub policy: LevelPolicy,
    /// Seed for the session's generator. `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_score: DEFAULT_TARGET_SCORE,
            max_questions: DEFAULT_MAX_QUESTIONS,
            mode: OracleMode::default(),
            policy: LevelPolicy::default(),
            seed: None,
        }
    }
}

fn default_target_score() -> i64 {
    DEFAULT_TARGET_SCORE
}

fn default_max_questions() -> i64 {
    DEFAULT_MAX_QUESTIONS
}

/// Background features fed to an ability provider.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StudentFeatures {
    /// 0 male, 1 female.
    #[serde(default)]
    pub gender: u8,
    /// 0 low, 1 high.
    #[serde(default)]
    pub parent_education: u8,
    /// 0 low, 1 middle, 2 high.
    #[serde(default)]
    pub parent_income: u8,
    #[serde(default)]
    pub first_child: u8,
    #[serde(default)]
    pub working: u8,
}

impl StudentFeatures {
    /// Number of entries in [`StudentFeatures::as_vector`].
    pub const LEN: usize = 5;

    pub fn as_vector(&self) -> [f64; Self::LEN] {
        [
            f64::from(self.gender),
            f64::from(self.parent_education),
            f64::from(self.parent_income),
            f64::from(self.first_child),
            f64::from(self.working),
        ]
    }
}

impl FromStr for StudentFeatures {
    type Err = String;

    /// Parses `gender,parent_education,parent_income,first_child,working`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<u8>()
                    .map_err(|_| format!("invalid feature value: '{}'", v.trim()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let [gender, parent_education, parent_income, first_child, working] = values[..] else {
            return Err(format!(
                "expected {} comma-separated features, got {}",
                Self::LEN,
                values.len()
            ));
        };
        Ok(Self {
            gender,
            parent_education,
            parent_income,
            first_child,
            working,
        })
    }
}

/// One student in a cohort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Known ability; skips the provider when set.
    #[serde(default)]
    pub ability: Option<f64>,
    /// Features passed to the ability provider.
    #[serde(default)]
    pub features: Option<StudentFeatures>,
    /// Per-student seed override.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// How sessions in a cohort are seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// Student `i` uses `seed + i`.
    #[default]
    PerSession,
    /// Every student replays the same random stream.
    Shared,
}

/// A named group of simulated students run under the same settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cohort {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub seed_strategy: SeedStrategy,
    #[serde(default)]
    pub students: Vec<Student>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_table() {
        let points: Vec<u32> = DifficultyLevel::ALL.iter().map(|l| l.points()).collect();
        assert_eq!(points, vec![5, 10, 15, 20]);
    }

    #[test]
    fn level_conversion_rejects_out_of_range() {
        assert_eq!(DifficultyLevel::try_from(3).unwrap(), DifficultyLevel::Three);
        assert!(DifficultyLevel::try_from(0).is_err());
        assert!(DifficultyLevel::try_from(5).is_err());
    }

    #[test]
    fn level_serializes_as_number() {
        let json = serde_json::to_string(&DifficultyLevel::Four).unwrap();
        assert_eq!(json, "4");
        assert!(serde_json::from_str::<DifficultyLevel>("7").is_err());
    }

    #[test]
    fn ability_thresholds() {
        assert_eq!(DifficultyLevel::One.ability_threshold(), 20.0);
        assert_eq!(DifficultyLevel::Four.ability_threshold(), 80.0);
    }

    #[test]
    fn policy_and_mode_parse() {
        assert_eq!(
            "Weighted".parse::<LevelPolicy>().unwrap(),
            LevelPolicy::Weighted
        );
        assert_eq!(
            "deterministic".parse::<LevelPolicy>().unwrap(),
            LevelPolicy::Deterministic
        );
        assert!("greedy".parse::<LevelPolicy>().is_err());
        assert_eq!(
            "interactive".parse::<OracleMode>().unwrap(),
            OracleMode::Interactive
        );
        assert!("batch".parse::<OracleMode>().is_err());
    }

    #[test]
    fn session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.target_score, 100);
        assert_eq!(config.max_questions, 10);
        assert_eq!(config.policy, LevelPolicy::Deterministic);
        assert!(config.seed.is_none());
    }

    #[test]
    fn features_parse_from_csv() {
        let f: StudentFeatures = "1, 1, 2, 1, 0".parse().unwrap();
        assert_eq!(f.parent_income, 2);
        assert_eq!(f.as_vector(), [1.0, 1.0, 2.0, 1.0, 0.0]);
        assert!("1,1,2".parse::<StudentFeatures>().is_err());
        assert!("1,1,x,1,0".parse::<StudentFeatures>().is_err());
    }
}
