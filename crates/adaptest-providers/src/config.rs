//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adaptest_core::model::{SessionConfig, StudentFeatures};
use adaptest_core::traits::AbilityProvider;

use crate::fixed::FixedProvider;
use crate::http::HttpProvider;
use crate::linear::{LinearModel, LinearProvider};

/// Configuration for a single ability provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Linear {
        #[serde(default = "default_intercept")]
        intercept: f64,
        #[serde(default = "default_weights")]
        weights: [f64; StudentFeatures::LEN],
    },
    Fixed {
        ability: f64,
    },
    Http {
        #[serde(default)]
        base_url: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Linear { intercept, weights } => f
                .debug_struct("Linear")
                .field("intercept", intercept)
                .field("weights", weights)
                .finish(),
            ProviderConfig::Fixed { ability } => {
                f.debug_struct("Fixed").field("ability", ability).finish()
            }
            ProviderConfig::Http {
                base_url,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// The built-in linear model.
    pub fn default_linear() -> Self {
        let model = LinearModel::default();
        ProviderConfig::Linear {
            intercept: model.intercept,
            weights: model.weights,
        }
    }
}

fn default_intercept() -> f64 {
    LinearModel::default().intercept
}

fn default_weights() -> [f64; StudentFeatures::LEN] {
    LinearModel::default().weights
}

/// Top-level adaptest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptestConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used when none is named.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Session defaults; CLI flags override them.
    #[serde(default)]
    pub session: SessionConfig,
    /// Max retries on provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Max concurrent provider calls in cohort runs.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_provider() -> String {
    "linear".to_string()
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./adaptest-results")
}

impl Default for AdaptestConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            session: SessionConfig::default(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        // Substituted values are not rescanned.
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => ProviderConfig::Http {
            base_url: resolve_env_vars(base_url),
            api_key: api_key.as_ref().map(|k| resolve_env_vars(k)),
            timeout_secs: *timeout_secs,
        },
        other => other.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment variable overrides: `ADAPTEST_HTTP_URL`, `ADAPTEST_HTTP_KEY`
/// (both apply to the provider named `http`).
pub fn load_config() -> Result<AdaptestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AdaptestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AdaptestConfig::default(),
    };

    // Apply env var overrides
    if let Ok(url) = std::env::var("ADAPTEST_HTTP_URL") {
        let entry = config
            .providers
            .entry("http".into())
            .or_insert(ProviderConfig::Http {
                base_url: String::new(),
                api_key: None,
                timeout_secs: None,
            });
        if let ProviderConfig::Http { base_url, .. } = entry {
            *base_url = url;
        }
    }

    if let Ok(key) = std::env::var("ADAPTEST_HTTP_KEY") {
        if let Some(ProviderConfig::Http { api_key, .. }) = config.providers.get_mut("http") {
            *api_key = Some(key);
        }
    }

    config
        .providers
        .entry("linear".into())
        .or_insert_with(ProviderConfig::default_linear);

    // Resolve env vars in all provider configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn AbilityProvider>> {
    tracing::debug!(provider = name, "creating ability provider");
    match config {
        ProviderConfig::Linear { intercept, weights } => {
            Ok(Box::new(LinearProvider::new(LinearModel {
                intercept: *intercept,
                weights: *weights,
            })))
        }
        ProviderConfig::Fixed { ability } => Ok(Box::new(FixedProvider::new(*ability))),
        ProviderConfig::Http {
            base_url,
            api_key,
            timeout_secs,
        } => {
            let provider = HttpProvider::new(base_url, api_key.clone(), *timeout_secs)
                .with_context(|| format!("failed to create provider '{name}'"))?;
            Ok(Box::new(provider))
        }
    }
}
