//! Linear ability model over the student feature vector.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use adaptest_core::model::StudentFeatures;
use adaptest_core::traits::AbilityProvider;

/// `intercept + Σ weight[i] * feature[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    /// Weights in `StudentFeatures::as_vector` order.
    pub weights: [f64; StudentFeatures::LEN],
}

impl Default for LinearModel {
    /// The ground truth the synthetic student data is generated from:
    /// `50 + 10 * parent_education + 10 * parent_income - 5 * working`.
    fn default() -> Self {
        Self {
            intercept: 50.0,
            weights: [0.0, 10.0, 10.0, 0.0, -5.0],
        }
    }
}

impl LinearModel {
    pub fn predict(&self, features: &StudentFeatures) -> f64 {
        self.weights
            .iter()
            .zip(features.as_vector())
            .fold(self.intercept, |acc, (w, x)| acc + w * x)
    }
}

/// Ability provider evaluating a [`LinearModel`] locally.
#[derive(Debug, Clone, Default)]
pub struct LinearProvider {
    model: LinearModel,
}

impl LinearProvider {
    pub fn new(model: LinearModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &LinearModel {
        &self.model
    }
}

#[async_trait]
impl AbilityProvider for LinearProvider {
    fn name(&self) -> &str {
        "linear"
    }

    async fn estimate(&self, features: &StudentFeatures) -> anyhow::Result<f64> {
        Ok(self.model.predict(features))
    }
}
