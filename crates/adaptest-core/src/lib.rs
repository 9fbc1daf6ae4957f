//! adaptest-core: Adaptive difficulty engine, oracles, and session traces.
//!
//! This crate defines the data model, the calibration/adaptive state machine,
//! the outcome oracles it consults, and the reports that trace sinks consume.

pub mod cohort;
pub mod engine;
pub mod error;
pub mod model;
pub mod oracle;
pub mod parser;
pub mod policy;
pub mod report;
pub mod statistics;
pub mod trace;
pub mod traits;

pub use engine::{AdaptiveEngine, EngineState, Session, StepOutcome};
pub use error::{EngineError, ProviderError};
