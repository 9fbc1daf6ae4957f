//! The `adaptest run` command.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use adaptest_core::model::{Attempt, LevelPolicy, OracleMode, StudentFeatures, TerminationReason};
use adaptest_core::oracle::{InteractiveOracle, LineAnswerSource};
use adaptest_core::report::SessionReport;
use adaptest_core::AdaptiveEngine;
use adaptest_providers::config::{load_config_from, AdaptestConfig};
use adaptest_providers::create_provider;
use adaptest_report::dot::{calibration_tree_dot, path_dot, write_dot};
use adaptest_report::html::write_html_report;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Answer source: interactive (stdin) or simulated
    #[arg(long)]
    pub mode: Option<OracleMode>,

    /// Adaptive level policy: deterministic or weighted
    #[arg(long)]
    pub policy: Option<LevelPolicy>,

    /// Score that ends the session
    #[arg(long, allow_negative_numbers = true)]
    pub target_score: Option<i64>,

    /// Question ceiling
    #[arg(long, allow_negative_numbers = true)]
    pub max_questions: Option<i64>,

    /// Generator seed (random if omitted; recorded in the report)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Known ability on the 0-100 scale
    #[arg(long, conflicts_with = "features")]
    pub ability: Option<f64>,

    /// Features for the ability provider: gender,parent_education,parent_income,first_child,working
    #[arg(long)]
    pub features: Option<StudentFeatures>,

    /// Ability provider name from the config
    #[arg(long)]
    pub provider: Option<String>,

    /// Student label stored in the report
    #[arg(long)]
    pub label: Option<String>,

    /// Output directory
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format: json, dot, html, all
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let formats = super::parse_formats(&args.format, &["json", "dot", "html"])?;

    let mut session = config.session.clone();
    if let Some(mode) = args.mode {
        session.mode = mode;
    }
    if let Some(policy) = args.policy {
        session.policy = policy;
    }
    if let Some(target) = args.target_score {
        session.target_score = target;
    }
    if let Some(max) = args.max_questions {
        session.max_questions = max;
    }
    if args.seed.is_some() {
        session.seed = args.seed;
    }

    let ability = match (args.ability, args.features) {
        (Some(ability), _) => Some(ability),
        (None, Some(features)) => {
            Some(estimate_ability(&config, args.provider.as_deref(), &features).await?)
        }
        (None, None) => None,
    };

    let mut engine = match session.mode {
        OracleMode::Simulated => {
            let ability = ability.context("simulated mode needs --ability or --features")?;
            AdaptiveEngine::simulated(&session, ability)?
        }
        OracleMode::Interactive => {
            let source = LineAnswerSource::new(BufReader::new(std::io::stdin()), std::io::stderr());
            let mut oracle = InteractiveOracle::new(source);
            if let Some(ability) = ability {
                oracle = oracle.with_ability(ability)?;
            }
            AdaptiveEngine::new(&session, Box::new(oracle))?
        }
    };

    eprintln!(
        "adaptest v{}: {} session, {} policy, target {}, up to {} questions (seed {})",
        env!("CARGO_PKG_VERSION"),
        session.mode,
        engine.policy(),
        engine.session().target_score(),
        engine.session().max_questions(),
        engine.seed()
    );
    if let Some(estimate) = engine.session().ability_estimate() {
        eprintln!("Ability estimate: {estimate:.1}/100");
    }

    let driven = drive(&mut engine);
    let report = SessionReport::from_engine(&engine, session.mode, args.label);
    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    let stem = file_stem(&report);

    let reason = match driven {
        Ok(reason) => reason,
        Err(e) => {
            // Keep what was answered before the input ended.
            println!("Session ended: {}", report.summary_line());
            save_outputs(&report, &output, &stem, &formats)?;
            return Err(e);
        }
    };
    tracing::info!(%reason, score = engine.session().score(), "session finished");

    println!("Final score: {}", report.final_score);
    println!("Session ended: {}", report.summary_line());
    save_outputs(&report, &output, &stem, &formats)
}

/// `{label}-{timestamp}`, with the label reduced to a single path component.
fn file_stem(report: &SessionReport) -> String {
    let name = report
        .label
        .as_deref()
        .map_or_else(|| "session".to_string(), sanitize_label);
    format!("{name}-{}", report.created_at.format("%Y-%m-%dT%H%M%S"))
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect::<String>()
        .replace("..", "_")
}

/// Step the engine to termination, re-asking after a rejected answer.
fn drive(engine: &mut AdaptiveEngine) -> Result<TerminationReason> {
    loop {
        match engine.step() {
            Ok(outcome) => {
                print_attempt(&outcome.attempt);
                if let Some(reason) = outcome.termination {
                    return Ok(reason);
                }
            }
            Err(e) if e.is_retryable() => eprintln!("{e}. Enter 1 or 0."),
            Err(e) => return Err(e.into()),
        }
    }
}

fn print_attempt(attempt: &Attempt) {
    println!(
        "Q{:<2} level {}  {:<9} +{:<2}  total {}",
        attempt.index,
        attempt.level,
        if attempt.correct { "correct" } else { "incorrect" },
        attempt.points_awarded,
        attempt.cumulative_score
    );
}

async fn estimate_ability(
    config: &AdaptestConfig,
    provider_name: Option<&str>,
    features: &StudentFeatures,
) -> Result<f64> {
    let name = provider_name.unwrap_or(&config.default_provider);
    let pconfig = config.providers.get(name).with_context(|| {
        format!(
            "provider '{name}' not found in config. Available: {:?}",
            config.providers.keys().collect::<Vec<_>>()
        )
    })?;
    let provider = create_provider(name, pconfig)?;
    provider
        .estimate(features)
        .await
        .with_context(|| format!("ability estimate from '{name}' failed"))
}

/// Write the report in each requested format.
pub fn save_outputs(
    report: &SessionReport,
    output: &Path,
    stem: &str,
    formats: &[&str],
) -> Result<()> {
    for fmt in formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "dot" => {
                let path = output.join(format!("{stem}.dot"));
                write_dot(&path_dot(report), &path)?;
                let tree = output.join(format!("{stem}-calibration.dot"));
                write_dot(&calibration_tree_dot(report), &tree)?;
                eprintln!("DOT graphs: {} {}", path.display(), tree.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => eprintln!("Unknown format: {fmt}"),
        }
    }
    Ok(())
}
