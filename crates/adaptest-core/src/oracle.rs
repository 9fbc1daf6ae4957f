//! Outcome oracles decide whether a single attempt is answered correctly.
//!
//! Two variants exist: [`InteractiveOracle`] reads one `0`/`1` token per
//! question from an [`AnswerSource`], and [`SimulatedOracle`] rolls against an
//! ability estimate using the session's generator.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use rand::rngs::StdRng;
use rand::Rng;

use crate::error::EngineError;
use crate::model::DifficultyLevel;

/// The question an oracle is asked to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    /// 1-based index the attempt will get if it is recorded.
    pub index: u32,
    pub level: DifficultyLevel,
    /// Score before this question.
    pub score: u32,
}

impl Question {
    pub fn points(&self) -> u32 {
        self.level.points()
    }
}

/// Decides correctness for one attempt.
pub trait OutcomeOracle: Send {
    /// Resolve `question`. Must not record anything itself; an `Err` means the
    /// attempt did not happen.
    fn decide(&mut self, question: &Question, rng: &mut StdRng) -> Result<bool, EngineError>;

    /// The ability estimate driving this oracle, if any.
    fn ability_estimate(&self) -> Option<f64> {
        None
    }
}

/// Clamp a provider's estimate into `[0, 100]`.
///
/// # Errors
///
/// Returns `InvalidConfiguration` for NaN, which has no meaningful clamp.
pub fn clamp_ability(estimate: f64) -> Result<f64, EngineError> {
    if estimate.is_nan() {
        return Err(EngineError::InvalidConfiguration(
            "ability estimate is NaN".into(),
        ));
    }
    Ok(estimate.clamp(0.0, 100.0))
}

// ---------------------------------------------------------------------------
// Simulated oracle
// ---------------------------------------------------------------------------

/// Simulates a student of fixed ability.
///
/// A question is answered correctly when a uniform draw falls under
/// `ability / 100` and the ability clears the level's threshold
/// (`level * 20`). The draw is taken even when the threshold fails so the
/// random stream does not depend on the gate.
#[derive(Debug, Clone)]
pub struct SimulatedOracle {
    ability: f64,
}

impl SimulatedOracle {
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `ability` is NaN.
    pub fn new(ability: f64) -> Result<Self, EngineError> {
        Ok(Self {
            ability: clamp_ability(ability)?,
        })
    }

    pub fn ability(&self) -> f64 {
        self.ability
    }
}

impl OutcomeOracle for SimulatedOracle {
    fn decide(&mut self, question: &Question, rng: &mut StdRng) -> Result<bool, EngineError> {
        let roll: f64 = rng.random();
        Ok(roll < self.ability / 100.0 && self.ability >= question.level.ability_threshold())
    }

    fn ability_estimate(&self) -> Option<f64> {
        Some(self.ability)
    }
}

// ---------------------------------------------------------------------------
// Interactive oracle
// ---------------------------------------------------------------------------

/// A channel yielding one raw answer token per question.
pub trait AnswerSource: Send {
    /// Fetch the token for `question`. `Ok(None)` means the channel is closed.
    fn next_token(&mut self, question: &Question) -> Result<Option<String>, EngineError>;
}

/// Parse an answer token. Only `"0"` and `"1"` are accepted, after the line
/// terminator and surrounding whitespace are stripped.
///
/// # Errors
///
/// Returns `InvalidAnswer` for anything else.
pub fn parse_answer(token: &str) -> Result<bool, EngineError> {
    match token.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(EngineError::InvalidAnswer {
            token: token.trim().to_string(),
        }),
    }
}

/// Reads answers from an external [`AnswerSource`].
pub struct InteractiveOracle<S> {
    source: S,
    ability: Option<f64>,
}

impl<S: AnswerSource> InteractiveOracle<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            ability: None,
        }
    }

    /// Attach an ability estimate for reporting. It does not affect outcomes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `ability` is NaN.
    pub fn with_ability(mut self, ability: f64) -> Result<Self, EngineError> {
        self.ability = Some(clamp_ability(ability)?);
        Ok(self)
    }
}

impl<S: AnswerSource> OutcomeOracle for InteractiveOracle<S> {
    fn decide(&mut self, question: &Question, _rng: &mut StdRng) -> Result<bool, EngineError> {
        let token = self
            .source
            .next_token(question)?
            .ok_or(EngineError::AnswerChannelClosed)?;
        parse_answer(&token)
    }

    fn ability_estimate(&self) -> Option<f64> {
        self.ability
    }
}

/// Line-oriented answer channel: writes a prompt, reads one line.
pub struct LineAnswerSource<R, W> {
    reader: R,
    prompt: W,
}

impl<R: BufRead, W: Write> LineAnswerSource<R, W> {
    pub fn new(reader: R, prompt: W) -> Self {
        Self { reader, prompt }
    }
}

impl<R: BufRead + Send, W: Write + Send> AnswerSource for LineAnswerSource<R, W> {
    fn next_token(&mut self, question: &Question) -> Result<Option<String>, EngineError> {
        write!(
            self.prompt,
            "Question {} (level {}, {} points): enter 1 if correct, 0 if incorrect\n> ",
            question.index,
            question.level,
            question.points()
        )?;
        self.prompt.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Replays a fixed sequence of tokens.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnswers {
    tokens: VecDeque<String>,
    served: usize,
}

impl ScriptedAnswers {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
            served: 0,
        }
    }

    /// Tokens handed out so far, including rejected ones.
    pub fn served(&self) -> usize {
        self.served
    }
}

impl AnswerSource for ScriptedAnswers {
    fn next_token(&mut self, _question: &Question) -> Result<Option<String>, EngineError> {
        let token = self.tokens.pop_front();
        if token.is_some() {
            self.served += 1;
        }
        Ok(token)
    }
}
