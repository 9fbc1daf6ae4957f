//! End-to-end session scenarios driven through the public engine API.
//!
//! Both level-selection policies are exercised; the scripted scenarios use
//! the deterministic policy, whose expected traces are fixed.

use adaptest_core::model::{
    DifficultyLevel, LevelPolicy, OracleMode, SessionConfig, TerminationReason,
};
use adaptest_core::oracle::{LineAnswerSource, ScriptedAnswers, SimulatedOracle};
use adaptest_core::policy::deterministic_level;
use adaptest_core::report::SessionReport;
use adaptest_core::{AdaptiveEngine, EngineError, EngineState};

fn config(target: i64, max: i64, policy: LevelPolicy) -> SessionConfig {
    SessionConfig {
        target_score: target,
        max_questions: max,
        mode: OracleMode::Interactive,
        policy,
        seed: Some(42),
    }
}

fn trace(engine: &AdaptiveEngine) -> Vec<(u32, u8, u32, u32)> {
    engine
        .session()
        .attempts()
        .iter()
        .map(|a| (a.index, a.level.number(), a.points_awarded, a.cumulative_score))
        .collect()
}

#[test]
fn scenario_a_all_correct_reaches_target() {
    let mut engine = AdaptiveEngine::interactive(
        &config(100, 10, LevelPolicy::Deterministic),
        ScriptedAnswers::new(["1"; 10]),
    )
    .unwrap();

    let reason = engine.run_to_completion().unwrap();

    assert_eq!(reason, TerminationReason::TargetReached);
    assert_eq!(
        trace(&engine),
        vec![
            (1, 1, 5, 5),
            (2, 2, 10, 15),
            (3, 3, 15, 30),
            (4, 4, 20, 50),
            (5, 4, 20, 70),
            (6, 4, 20, 90),
            (7, 4, 20, 110),
        ]
    );
    assert_eq!(engine.session().score(), 110);
    assert_eq!(engine.state(), EngineState::Terminated(reason));
}

#[test]
fn scenario_b_question_cap() {
    let mut engine = AdaptiveEngine::interactive(
        &config(1000, 5, LevelPolicy::Deterministic),
        ScriptedAnswers::new(["1"; 10]),
    )
    .unwrap();

    let reason = engine.run_to_completion().unwrap();

    assert_eq!(reason, TerminationReason::MaxQuestionsReached);
    assert_eq!(engine.session().attempts().len(), 5);
    assert_eq!(engine.session().score(), 70);
    assert_eq!(
        engine.session().termination_reason(),
        Some(TerminationReason::MaxQuestionsReached)
    );
}

#[test]
fn scenario_c_invalid_token() {
    let mut engine = AdaptiveEngine::interactive(
        &config(100, 10, LevelPolicy::Deterministic),
        ScriptedAnswers::new(["1", "yes"]),
    )
    .unwrap();
    engine.step().unwrap();
    let before = engine.session().attempts().len();

    let err = engine.step().unwrap_err();

    assert!(matches!(err, EngineError::InvalidAnswer { ref token } if token == "yes"));
    assert_eq!(engine.session().attempts().len(), before);
}

#[test]
fn scenario_d_zero_questions_rejected() {
    let result = AdaptiveEngine::interactive(
        &config(100, 0, LevelPolicy::Deterministic),
        ScriptedAnswers::new(["1"]),
    );
    assert!(matches!(result, Err(EngineError::InvalidConfiguration(_))));
}

#[test]
fn interactive_over_a_line_channel() {
    let input = std::io::Cursor::new("1\n1\nmaybe\n1\n1\n1\n1\n1\n");
    let mut engine = AdaptiveEngine::interactive(
        &config(100, 10, LevelPolicy::Deterministic),
        LineAnswerSource::new(input, std::io::sink()),
    )
    .unwrap();

    let mut rejected = 0;
    let reason = loop {
        match engine.step() {
            Ok(outcome) => {
                if let Some(reason) = outcome.termination {
                    break reason;
                }
            }
            Err(e) if e.is_retryable() => rejected += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    };

    assert_eq!(rejected, 1);
    assert_eq!(reason, TerminationReason::TargetReached);
    assert_eq!(engine.session().score(), 110);
}

#[test]
fn adaptive_levels_follow_deterministic_policy() {
    // Mixed answers; every adaptive level must equal the policy of the prior score.
    let answers = ["0", "1", "0", "1", "1", "0", "1", "0", "1", "1"];
    let mut engine = AdaptiveEngine::interactive(
        &config(1000, 10, LevelPolicy::Deterministic),
        ScriptedAnswers::new(answers),
    )
    .unwrap();
    engine.run_to_completion().unwrap();

    let attempts = engine.session().attempts();
    for pair in attempts.windows(2).skip(3) {
        assert_eq!(pair[1].level, deterministic_level(pair[0].cumulative_score));
        assert_ne!(pair[1].level, DifficultyLevel::Two);
    }
}

#[test]
fn simulated_sessions_under_both_policies() {
    for policy in [LevelPolicy::Deterministic, LevelPolicy::Weighted] {
        for seed in 0..25 {
            for ability in [15.0, 45.0, 65.0, 95.0] {
                let cfg = SessionConfig {
                    mode: OracleMode::Simulated,
                    seed: Some(seed),
                    ..config(100, 10, policy)
                };
                let mut engine = AdaptiveEngine::simulated(&cfg, ability).unwrap();
                let reason = engine.run_to_completion().unwrap();
                let session = engine.session();

                let attempts = session.attempts();
                assert!(attempts.len() <= 10);
                assert!(attempts
                    .windows(2)
                    .all(|w| w[0].cumulative_score <= w[1].cumulative_score));
                match reason {
                    TerminationReason::TargetReached => assert!(session.score() >= 100),
                    TerminationReason::MaxQuestionsReached => {
                        assert!(session.score() < 100);
                        assert_eq!(attempts.len(), 10);
                    }
                }
                // Levels above the ability threshold are never answered.
                for a in attempts {
                    if ability < a.level.ability_threshold() {
                        assert!(!a.correct);
                    }
                }
            }
        }
    }
}

#[test]
fn gated_oracle_never_succeeds_in_a_session() {
    let cfg = SessionConfig {
        mode: OracleMode::Simulated,
        ..config(100, 10, LevelPolicy::Weighted)
    };
    let oracle = SimulatedOracle::new(19.0).unwrap();
    let mut engine = AdaptiveEngine::new(&cfg, Box::new(oracle)).unwrap();
    engine.run_to_completion().unwrap();
    assert_eq!(engine.session().score(), 0);
    assert_eq!(engine.session().attempts().len(), 10);
}

#[test]
fn report_from_scenario_a() {
    let mut engine = AdaptiveEngine::interactive(
        &config(100, 10, LevelPolicy::Deterministic),
        ScriptedAnswers::new(["1"; 10]),
    )
    .unwrap();
    engine.run_to_completion().unwrap();

    let report = SessionReport::from_engine(&engine, OracleMode::Interactive, None);
    assert_eq!(report.final_score, 110);
    assert_eq!(report.questions_asked, 7);
    assert!(report.attempts.iter().all(|r| r.correct));
    assert_eq!(report.attempts.last().unwrap().cumulative_score, 110);
}
