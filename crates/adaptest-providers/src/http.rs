//! HTTP ability provider for a remotely served estimation model.
//!
//! Sends `POST {base_url}/estimate` with an [`EstimateRequest`] body and
//! expects `{"estimate": <number>}` back.

use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument;

use adaptest_core::model::StudentFeatures;
use adaptest_core::traits::{AbilityProvider, EstimateRequest, EstimateResponse};

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Ability provider backed by an HTTP model-serving endpoint.
pub struct HttpProvider {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpProvider {
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ProviderError> {
        let base = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        })
    }
}

#[async_trait]
impl AbilityProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, features), fields(base_url = %self.base_url))]
    async fn estimate(&self, features: &StudentFeatures) -> anyhow::Result<f64> {
        let mut request = self
            .client
            .post(format!("{}/estimate", self.base_url))
            .json(&EstimateRequest::from(features));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                ProviderError::NetworkError(format!(
                    "estimation service not reachable at {}",
                    self.base_url
                ))
            } else {
                ProviderError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 429 {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(1000, |secs| secs * 1000);
            return Err(ProviderError::RateLimited { retry_after_ms }.into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let body: EstimateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidEstimate(format!("failed to parse response: {e}")))?;
        if !body.estimate.is_finite() {
            return Err(ProviderError::InvalidEstimate(format!(
                "estimate is not finite: {}",
                body.estimate
            ))
            .into());
        }

        tracing::debug!(estimate = body.estimate, "received ability estimate");
        Ok(body.estimate)
    }
}
