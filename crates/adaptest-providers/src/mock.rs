//! Mock provider for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use adaptest_core::model::StudentFeatures;
use adaptest_core::traits::AbilityProvider;

use crate::error::ProviderError;

/// A mock ability provider for testing the cohort runner without a model.
///
/// Serves queued results first, then falls back to a default estimate.
pub struct MockProvider {
    /// Results handed out before the default applies.
    queued: Mutex<VecDeque<Result<f64, ProviderError>>>,
    /// Estimate returned once the queue is drained.
    default_estimate: f64,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Features of the last request.
    last_features: Mutex<Option<StudentFeatures>>,
}

impl MockProvider {
    /// Create a mock that always returns the same estimate.
    pub fn with_fixed_estimate(estimate: f64) -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            default_estimate: estimate,
            call_count: AtomicU32::new(0),
            last_features: Mutex::new(None),
        }
    }

    /// Create a mock that serves `results` in order, then `default_estimate`.
    pub fn with_sequence(
        results: impl IntoIterator<Item = Result<f64, ProviderError>>,
        default_estimate: f64,
    ) -> Self {
        Self {
            queued: Mutex::new(results.into_iter().collect()),
            ..Self::with_fixed_estimate(default_estimate)
        }
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the features of the last request made to this provider.
    pub fn last_features(&self) -> Option<StudentFeatures> {
        *self.last_features.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AbilityProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn estimate(&self, features: &StudentFeatures) -> anyhow::Result<f64> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_features.lock().unwrap_or_else(|e| e.into_inner()) = Some(*features);

        let next = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(result) => Ok(result?),
            None => Ok(self.default_estimate),
        }
    }
}
