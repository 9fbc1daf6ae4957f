//! The `adaptest cohort` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use adaptest_core::cohort::{CohortRunner, CohortRunnerConfig, ProgressReporter};
use adaptest_core::parser;
use adaptest_core::report::{CohortReport, SessionReport};
use adaptest_core::traits::AbilityProvider;
use adaptest_providers::config::load_config_from;
use adaptest_providers::create_provider;
use adaptest_report::html::write_cohort_html_report;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_session_start(&self, student_id: &str, ability: f64) {
        eprintln!("  Starting: {student_id} (ability {ability:.1})");
    }

    fn on_session_complete(&self, report: &SessionReport) {
        eprintln!(
            "  Done: {} :: {}",
            report.label.as_deref().unwrap_or("-"),
            report.summary_line()
        );
    }

    fn on_student_error(&self, student_id: &str, error: &str) {
        eprintln!("  ERROR: {student_id}: {error}");
    }

    fn on_cohort_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} sessions, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    cohort_path: PathBuf,
    provider_name: Option<String>,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let formats = super::parse_formats(&format, &["json", "html"])?;

    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let cohorts = if cohort_path.is_dir() {
        parser::load_cohort_directory(&cohort_path)?
    } else {
        vec![parser::parse_cohort(&cohort_path)?]
    };

    let name = provider_name.unwrap_or_else(|| config.default_provider.clone());
    let Some(pconfig) = config.providers.get(&name) else {
        anyhow::bail!(
            "provider '{name}' not found in config. Available: {:?}",
            config.providers.keys().collect::<Vec<_>>()
        );
    };
    let provider: Arc<dyn AbilityProvider> = Arc::from(create_provider(&name, pconfig)?);

    let runner = CohortRunner::new(
        provider,
        CohortRunnerConfig {
            parallelism,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        },
    );
    let reporter = ConsoleReporter;
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    for cohort in &cohorts {
        eprintln!(
            "adaptest v{}: cohort '{}' with {} students via '{name}'",
            env!("CARGO_PKG_VERSION"),
            cohort.name,
            cohort.students.len()
        );
        eprintln!();

        let report = runner.run(cohort, &reporter).await?;
        print_summary(&report);

        let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");
        for fmt in &formats {
            match *fmt {
                "json" => {
                    let path = output.join(format!("cohort-{}-{timestamp}.json", cohort.id));
                    report.save_json(&path)?;
                    eprintln!("Results saved to: {}", path.display());
                }
                "html" => {
                    let path = output.join(format!("cohort-{}-{timestamp}.html", cohort.id));
                    write_cohort_html_report(&report, &path)?;
                    eprintln!("HTML report: {}", path.display());
                }
                _ => eprintln!("Unknown format: {fmt}"),
            }
        }
    }

    Ok(())
}

fn print_summary(report: &CohortReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Student", "Ability", "Score", "Questions", "Outcome"]);

    for s in &report.sessions {
        table.add_row(vec![
            Cell::new(s.label.as_deref().unwrap_or("-")),
            Cell::new(
                s.ability_estimate
                    .map_or_else(|| "-".to_string(), |a| format!("{a:.1}")),
            ),
            Cell::new(s.final_score),
            Cell::new(s.questions_asked),
            Cell::new(
                s.termination_reason
                    .map_or_else(|| "-".to_string(), |r| r.to_string()),
            ),
        ]);
    }

    println!("{table}");
    println!(
        "{}: mean score {:.1}, mean questions {:.1}, target reached {:.0}%",
        report.cohort.name,
        report.stats.mean_final_score,
        report.stats.mean_questions,
        report.stats.target_reached_rate * 100.0
    );
}
