//! Core trait definitions for ability providers.
//!
//! Implementations live in the `adaptest-providers` crate. The engine never
//! calls a provider directly; callers resolve an ability first and clamp it
//! with [`crate::oracle::clamp_ability`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::StudentFeatures;

/// Trait for backends that estimate a student's ability from features.
#[async_trait]
pub trait AbilityProvider: Send + Sync {
    /// Human-readable provider name (e.g. "linear").
    fn name(&self) -> &str;

    /// Estimate ability, nominally on a 0-100 scale. Values outside that
    /// range are clamped by the caller.
    async fn estimate(&self, features: &StudentFeatures) -> anyhow::Result<f64>;
}

/// Wire shape of an estimate request, shared by HTTP providers and servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub features: StudentFeatures,
    /// The same features as a positional vector.
    pub vector: Vec<f64>,
}

impl From<&StudentFeatures> for EstimateRequest {
    fn from(features: &StudentFeatures) -> Self {
        Self {
            features: *features,
            vector: features.as_vector().to_vec(),
        }
    }
}

/// Wire shape of an estimate response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub estimate: f64,
}
