//! End-to-end pipeline tests: cohort file -> provider -> sessions -> renderers.
//!
//! These drive the library crates directly with a mock provider so provider
//! failures can be scripted.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adaptest_core::cohort::{CohortRunner, CohortRunnerConfig, NoopReporter};
use adaptest_core::model::TerminationReason;
use adaptest_core::parser::{parse_cohort, parse_cohort_str};
use adaptest_core::report::CohortReport;
use adaptest_providers::mock::MockProvider;
use adaptest_providers::{LinearProvider, ProviderError};
use adaptest_report::{calibration_tree_dot, generate_cohort_html, path_dot};

fn fast_config() -> CohortRunnerConfig {
    CohortRunnerConfig {
        parallelism: 2,
        max_retries: 3,
        retry_delay: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn e2e_representative_cohort() {
    let cohort = parse_cohort(Path::new("../../cohorts/representative.toml")).unwrap();
    let runner = CohortRunner::new(Arc::new(LinearProvider::default()), fast_config());

    let report = runner.run(&cohort, &NoopReporter).await.unwrap();

    assert_eq!(report.sessions.len(), 3);
    let abilities: Vec<f64> = report
        .sessions
        .iter()
        .map(|s| s.ability_estimate.unwrap())
        .collect();
    assert_eq!(abilities, vec![80.0, 55.0, 45.0]);
    for session in &report.sessions {
        assert!(session.questions_asked <= 10);
        match session.termination_reason {
            Some(TerminationReason::TargetReached) => assert!(session.final_score >= 100),
            Some(TerminationReason::MaxQuestionsReached) => assert_eq!(session.questions_asked, 10),
            None => panic!("session did not terminate"),
        }
        let dot = path_dot(session);
        assert!(dot.contains(&format!("Total score: {}", session.final_score)));
        assert_eq!(
            calibration_tree_dot(session)
                .lines()
                .filter(|l| l.contains("style=bold"))
                .count(),
            3
        );
    }

    let html = generate_cohort_html(&report);
    assert!(html.contains("Representative Students"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cohort.json");
    report.save_json(&path).unwrap();
    let loaded = CohortReport::load_json(&path).unwrap();
    assert_eq!(loaded.sessions.len(), 3);
    assert_eq!(loaded.stats.sessions, 3);
}

#[tokio::test]
async fn e2e_transient_provider_errors_are_retried() {
    let cohort = parse_cohort_str(
        r#"
[cohort]
id = "one"
name = "One"
seed = 1

[[students]]
id = "flaky"
features = { parent_income = 2 }
"#,
        Path::new("one.toml"),
    )
    .unwrap();
    let provider = Arc::new(MockProvider::with_sequence(
        [
            Err(ProviderError::NetworkError("connection reset".into())),
            Err(ProviderError::RateLimited { retry_after_ms: 1 }),
        ],
        72.0,
    ));
    let runner = CohortRunner::new(provider.clone(), fast_config());

    let report = runner.run(&cohort, &NoopReporter).await.unwrap();

    assert_eq!(provider.call_count(), 3);
    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.sessions[0].ability_estimate, Some(72.0));
}

#[tokio::test]
async fn e2e_permanent_provider_error_excludes_student() {
    let cohort = parse_cohort_str(
        r#"
[cohort]
id = "mixed"
name = "Mixed"

[[students]]
id = "known"
ability = 90.0

[[students]]
id = "estimated"
features = { parent_education = 1 }
"#,
        Path::new("mixed.toml"),
    )
    .unwrap();
    let provider = Arc::new(MockProvider::with_sequence(
        [Err(ProviderError::AuthenticationFailed("bad key".into()))],
        50.0,
    ));
    let runner = CohortRunner::new(provider.clone(), fast_config());

    let report = runner.run(&cohort, &NoopReporter).await.unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(report.cohort.student_count, 2);
    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.sessions[0].label.as_deref(), Some("known"));
}

#[tokio::test]
async fn e2e_invalid_bounds_fail_the_run() {
    let cohort = parse_cohort_str(
        r#"
[cohort]
id = "broken"
name = "Broken"
target_score = -1

[[students]]
id = "s"
ability = 50.0
"#,
        Path::new("broken.toml"),
    )
    .unwrap();
    let runner = CohortRunner::new(Arc::new(MockProvider::with_fixed_estimate(50.0)), fast_config());

    let err = runner.run(&cohort, &NoopReporter).await.unwrap_err();
    assert!(err.to_string().contains("target_score"));
}
