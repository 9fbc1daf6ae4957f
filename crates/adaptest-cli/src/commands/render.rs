//! The `adaptest render` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::report::SessionReport;

use super::run::save_outputs;

pub fn execute(report_path: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let formats = super::parse_formats(&format, &["dot", "html"])?;
    let report = SessionReport::load_json(&report_path)?;
    println!("Loaded session: {}", report.summary_line());

    let output = output
        .or_else(|| report_path.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = report_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "session".to_string());

    save_outputs(&report, &output, &stem, &formats)
}
