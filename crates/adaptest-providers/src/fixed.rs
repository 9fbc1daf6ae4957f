//! Constant ability provider.

use async_trait::async_trait;

use adaptest_core::model::StudentFeatures;
use adaptest_core::traits::AbilityProvider;

/// Returns the same estimate for every student.
#[derive(Debug, Clone, Copy)]
pub struct FixedProvider {
    ability: f64,
}

impl FixedProvider {
    pub fn new(ability: f64) -> Self {
        Self { ability }
    }
}

#[async_trait]
impl AbilityProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn estimate(&self, _features: &StudentFeatures) -> anyhow::Result<f64> {
        Ok(self.ability)
    }
}
