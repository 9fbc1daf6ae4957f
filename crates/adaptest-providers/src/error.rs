//! Provider error types.
//!
//! Re-exported from `adaptest-core`, where the cohort runner downcasts them.

pub use adaptest_core::error::ProviderError;
