//! Cohort runner.
//!
//! Resolves an ability for every student in a cohort (concurrently, bounded
//! by `parallelism`, retrying transient provider errors), then runs one
//! simulated session per student. Each session gets its own engine and its
//! own seeded generator; sessions never share random state unless the cohort
//! asks for it with [`SeedStrategy::Shared`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::engine::AdaptiveEngine;
use crate::error::ProviderError;
use crate::model::{Cohort, OracleMode, SeedStrategy, SessionConfig, Student};
use crate::oracle::clamp_ability;
use crate::report::{CohortReport, CohortSummary, SessionReport};
use crate::statistics::compute_cohort_stats;
use crate::traits::AbilityProvider;

/// Configuration for the cohort runner.
#[derive(Debug, Clone)]
pub struct CohortRunnerConfig {
    /// Maximum concurrent provider calls.
    pub parallelism: usize,
    /// Retries on transient provider errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time.
    pub retry_delay: Duration,
}

impl Default for CohortRunnerConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_session_start(&self, student_id: &str, ability: f64);
    fn on_session_complete(&self, report: &SessionReport);
    fn on_student_error(&self, student_id: &str, error: &str);
    fn on_cohort_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_session_start(&self, _: &str, _: f64) {}
    fn on_session_complete(&self, _: &SessionReport) {}
    fn on_student_error(&self, _: &str, _: &str) {}
    fn on_cohort_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Runs every student of a cohort through a simulated session.
pub struct CohortRunner {
    provider: Arc<dyn AbilityProvider>,
    config: CohortRunnerConfig,
}

impl CohortRunner {
    pub fn new(provider: Arc<dyn AbilityProvider>, config: CohortRunnerConfig) -> Self {
        Self { provider, config }
    }

    /// Run the cohort.
    ///
    /// Students whose ability cannot be resolved are reported through
    /// `progress` and left out of the report. Invalid session bounds fail the
    /// whole run.
    pub async fn run(&self, cohort: &Cohort, progress: &dyn ProgressReporter) -> Result<CohortReport> {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let base_seed = cohort.session.seed.unwrap_or_else(rand::random);
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();
        for (index, student) in cohort.students.iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            futures.push(async move {
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    resolve_ability(provider.as_ref(), student, &config).await
                };
                (index, inner.await)
            });
        }

        let total = futures.len();
        let mut abilities = Vec::with_capacity(total);
        let mut failed = 0usize;
        while let Some((index, result)) = futures.next().await {
            match result {
                Ok(ability) => abilities.push((index, ability)),
                Err(e) => {
                    let id = &cohort.students[index].id;
                    tracing::error!("ability estimate failed for {id}: {e:#}");
                    progress.on_student_error(id, &e.to_string());
                    failed += 1;
                }
            }
        }
        abilities.sort_by_key(|(index, _)| *index);

        let mut sessions = Vec::with_capacity(abilities.len());
        for (index, ability) in abilities {
            let student = &cohort.students[index];
            let config = SessionConfig {
                mode: OracleMode::Simulated,
                seed: Some(session_seed(cohort.seed_strategy, student, index, base_seed)),
                ..cohort.session.clone()
            };

            progress.on_session_start(&student.id, ability);
            let mut engine = AdaptiveEngine::simulated(&config, ability)?;
            engine.run_to_completion()?;

            let report =
                SessionReport::from_engine(&engine, OracleMode::Simulated, Some(student.id.clone()));
            progress.on_session_complete(&report);
            sessions.push(report);
        }

        let elapsed = start.elapsed();
        progress.on_cohort_complete(total, sessions.len(), failed, elapsed);

        Ok(CohortReport {
            id: run_id,
            created_at: chrono::Utc::now(),
            cohort: CohortSummary {
                id: cohort.id.clone(),
                name: cohort.name.clone(),
                student_count: cohort.students.len(),
            },
            stats: compute_cohort_stats(&sessions),
            sessions,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

/// Seed for the session of the `index`-th student.
pub fn session_seed(strategy: SeedStrategy, student: &Student, index: usize, base_seed: u64) -> u64 {
    student.seed.unwrap_or(match strategy {
        SeedStrategy::Shared => base_seed,
        SeedStrategy::PerSession => base_seed.wrapping_add(index as u64),
    })
}

async fn resolve_ability(
    provider: &dyn AbilityProvider,
    student: &Student,
    config: &CohortRunnerConfig,
) -> Result<f64> {
    if let Some(ability) = student.ability {
        return Ok(clamp_ability(ability)?);
    }
    let Some(features) = &student.features else {
        anyhow::bail!("student '{}' has neither ability nor features", student.id);
    };

    let mut last_error = None;
    let mut retry_delay = config.retry_delay;
    for retry in 0..=config.max_retries {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(Duration::from_secs(60));
        }
        match provider.estimate(features).await {
            Ok(estimate) => {
                let ability = clamp_ability(estimate)?;
                if ability != estimate {
                    tracing::debug!(
                        student = %student.id,
                        estimate,
                        ability,
                        "clamped provider estimate"
                    );
                }
                return Ok(ability);
            }
            Err(e) => {
                if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                    if provider_error.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = provider_error.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms);
                    }
                }
                tracing::warn!(
                    student = %student.id,
                    provider = provider.name(),
                    attempt = retry + 1,
                    "estimate failed: {e:#}"
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}
