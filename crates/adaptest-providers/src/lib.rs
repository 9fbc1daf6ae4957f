//! adaptest-providers: Ability estimation backends.
//!
//! Implements the `AbilityProvider` trait for a built-in linear model, a
//! fixed estimate, and a remote HTTP model service, plus the config file
//! that selects between them.

pub mod config;
pub mod error;
pub mod fixed;
pub mod http;
pub mod linear;
pub mod mock;

pub use config::{create_provider, load_config, load_config_from, AdaptestConfig, ProviderConfig};
pub use error::ProviderError;
pub use fixed::FixedProvider;
pub use http::HttpProvider;
pub use linear::{LinearModel, LinearProvider};
