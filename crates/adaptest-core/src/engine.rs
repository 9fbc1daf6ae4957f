//! Adaptive difficulty engine.
//!
//! A session runs as an explicit three-state machine:
//!
//! ```text
//! Calibrating(1..4) --queue drained--> Adapting
//!        |                               |
//!        +------ target or ceiling ------+--> Terminated
//! ```
//!
//! Each call to [`AdaptiveEngine::step`] resolves exactly one question. The
//! engine owns its session, its oracle, and a generator seeded once from the
//! session configuration.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::EngineError;
use crate::model::{
    Attempt, DifficultyLevel, LevelPolicy, SessionConfig, TerminationReason, POINTS,
};
use crate::oracle::{AnswerSource, InteractiveOracle, OutcomeOracle, Question, SimulatedOracle};
use crate::policy::select_level;
use crate::trace::Trace;

/// Levels asked, in order, before adaptive selection starts.
pub const CALIBRATION_LEVELS: [DifficultyLevel; 4] = DifficultyLevel::ALL;

/// Largest accepted target. A session stops once the score reaches the
/// target, so the running score stays below `target + 20` and fits a `u32`.
pub const MAX_TARGET_SCORE: u32 = u32::MAX - POINTS[3];

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// `next` indexes into [`CALIBRATION_LEVELS`].
    Calibrating { next: usize },
    Adapting,
    Terminated(TerminationReason),
}

/// Mutable record of one assessment run.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    ability_estimate: Option<f64>,
    target_score: u32,
    max_questions: u32,
    trace: Trace,
    termination_reason: Option<TerminationReason>,
}

impl Session {
    pub fn ability_estimate(&self) -> Option<f64> {
        self.ability_estimate
    }

    pub fn target_score(&self) -> u32 {
        self.target_score
    }

    pub fn max_questions(&self) -> u32 {
        self.max_questions
    }

    /// Read-only view of the recorded attempts.
    pub fn attempts(&self) -> &[Attempt] {
        self.trace.attempts()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn score(&self) -> u32 {
        self.trace.cumulative_score()
    }

    pub fn termination_reason(&self) -> Option<TerminationReason> {
        self.termination_reason
    }

    fn stop_condition(&self) -> Option<TerminationReason> {
        if self.score() >= self.target_score {
            Some(TerminationReason::TargetReached)
        } else if self.trace.len() >= self.max_questions as usize {
            Some(TerminationReason::MaxQuestionsReached)
        } else {
            None
        }
    }
}

/// Result of a successful step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub attempt: Attempt,
    /// Set when this step ended the session.
    pub termination: Option<TerminationReason>,
}

/// The adaptive difficulty engine.
pub struct AdaptiveEngine {
    session: Session,
    state: EngineState,
    policy: LevelPolicy,
    seed: u64,
    rng: StdRng,
    oracle: Box<dyn OutcomeOracle>,
    /// Adaptive level chosen for a step whose oracle call failed.
    pending_level: Option<DifficultyLevel>,
}

impl AdaptiveEngine {
    /// Build an engine around any oracle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `target_score` or `max_questions` is
    /// not positive or does not fit in a `u32`, or if `target_score` exceeds
    /// [`MAX_TARGET_SCORE`].
    pub fn new(config: &SessionConfig, oracle: Box<dyn OutcomeOracle>) -> Result<Self, EngineError> {
        let target_score = positive_bound("target_score", config.target_score)?;
        if target_score > MAX_TARGET_SCORE {
            return Err(EngineError::InvalidConfiguration(format!(
                "target_score is too large: {target_score} (max {MAX_TARGET_SCORE})"
            )));
        }
        let max_questions = positive_bound("max_questions", config.max_questions)?;
        let seed = config.seed.unwrap_or_else(rand::random);

        tracing::debug!(
            target_score,
            max_questions,
            policy = %config.policy,
            seed,
            "session created"
        );

        Ok(Self {
            session: Session {
                ability_estimate: oracle.ability_estimate(),
                target_score,
                max_questions,
                trace: Trace::new(),
                termination_reason: None,
            },
            state: EngineState::Calibrating { next: 0 },
            policy: config.policy,
            seed,
            rng: StdRng::seed_from_u64(seed),
            oracle,
            pending_level: None,
        })
    }

    /// Engine whose answers are simulated from `ability`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for bad bounds or a NaN ability.
    pub fn simulated(config: &SessionConfig, ability: f64) -> Result<Self, EngineError> {
        Self::new(config, Box::new(SimulatedOracle::new(ability)?))
    }

    /// Engine whose answers are read from `source`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for bad bounds.
    pub fn interactive<S>(config: &SessionConfig, source: S) -> Result<Self, EngineError>
    where
        S: AnswerSource + 'static,
    {
        Self::new(config, Box::new(InteractiveOracle::new(source)))
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn policy(&self) -> LevelPolicy {
        self.policy
    }

    /// Seed the session generator was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, EngineState::Terminated(_))
    }

    /// Resolve one question.
    ///
    /// # Errors
    ///
    /// Returns `SessionClosed` after termination, or whatever the oracle
    /// raised. On error nothing is recorded and a retry asks the same level.
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        let level = match self.state {
            EngineState::Terminated(_) => return Err(EngineError::SessionClosed),
            EngineState::Calibrating { next } => CALIBRATION_LEVELS[next],
            EngineState::Adapting => match self.pending_level.take() {
                Some(level) => level,
                None => select_level(self.policy, self.session.score(), &mut self.rng),
            },
        };

        let question = Question {
            index: self.session.trace.len() as u32 + 1,
            level,
            score: self.session.score(),
        };

        let correct = match self.oracle.decide(&question, &mut self.rng) {
            Ok(correct) => correct,
            Err(e) => {
                if self.state == EngineState::Adapting {
                    self.pending_level = Some(level);
                }
                tracing::warn!(question = question.index, %level, "attempt not recorded: {e}");
                return Err(e);
            }
        };

        let attempt = *self.session.trace.record(level, correct);
        tracing::debug!(
            question = attempt.index,
            %level,
            correct,
            points = attempt.points_awarded,
            total = attempt.cumulative_score,
            "attempt recorded"
        );

        self.state = self.next_state();
        if let EngineState::Terminated(reason) = self.state {
            self.session.termination_reason = Some(reason);
            tracing::info!(
                score = attempt.cumulative_score,
                questions = attempt.index,
                "session terminated: {reason}"
            );
        }

        Ok(StepOutcome {
            attempt,
            termination: self.session.termination_reason,
        })
    }

    /// Step until the session terminates.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first step error.
    pub fn run_to_completion(&mut self) -> Result<TerminationReason, EngineError> {
        loop {
            if let Some(reason) = self.step()?.termination {
                return Ok(reason);
            }
        }
    }

    fn next_state(&self) -> EngineState {
        if let Some(reason) = self.session.stop_condition() {
            return EngineState::Terminated(reason);
        }
        match self.state {
            EngineState::Calibrating { next } if next + 1 < CALIBRATION_LEVELS.len() => {
                EngineState::Calibrating { next: next + 1 }
            }
            EngineState::Calibrating { .. } | EngineState::Adapting => EngineState::Adapting,
            terminated @ EngineState::Terminated(_) => terminated,
        }
    }
}

fn positive_bound(name: &str, value: i64) -> Result<u32, EngineError> {
    if value <= 0 {
        return Err(EngineError::InvalidConfiguration(format!(
            "{name} must be positive, got {value}"
        )));
    }
    u32::try_from(value).map_err(|_| {
        EngineError::InvalidConfiguration(format!("{name} is too large: {value}"))
    })
}
