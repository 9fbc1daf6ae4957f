//! adaptest-report: Trace sinks for finished sessions.
//!
//! Renders session reports as Graphviz DOT (question path and calibration
//! tree) and as self-contained HTML for sessions and cohorts.

pub mod dot;
pub mod html;

pub use dot::{calibration_tree_dot, path_dot, write_dot};
pub use html::{generate_cohort_html, generate_html, write_cohort_html_report, write_html_report};
