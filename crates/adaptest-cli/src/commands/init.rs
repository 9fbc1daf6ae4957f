//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create adaptest.toml
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    // Create example cohort
    std::fs::create_dir_all("cohorts")?;
    let example_path = std::path::Path::new("cohorts/example.toml");
    if example_path.exists() {
        println!("cohorts/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_COHORT)?;
        println!("Created cohorts/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: adaptest validate --cohort cohorts/example.toml");
    println!("  2. Run: adaptest cohort --cohort cohorts/example.toml --format all");
    println!("  3. Run: adaptest run --mode interactive");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

default_provider = "linear"
parallelism = 4
max_retries = 3
retry_delay_ms = 1000
output_dir = "./adaptest-results"

[session]
target_score = 100
max_questions = 10
mode = "simulated"
policy = "deterministic"

[providers.linear]
type = "linear"
intercept = 50.0
weights = [0.0, 10.0, 10.0, 0.0, -5.0]

# A remotely served estimation model:
# [providers.remote]
# type = "http"
# base_url = "http://localhost:8080"
# api_key = "${ADAPTEST_HTTP_KEY}"
"#;

const EXAMPLE_COHORT: &str = r#"[cohort]
id = "example"
name = "Representative Students"
description = "Three representative students estimated from background features"
target_score = 100
max_questions = 10
policy = "weighted"
seed = 42
seed_strategy = "per_session"

[[students]]
id = "excellent"
name = "Excellent"
features = { gender = 1, parent_education = 1, parent_income = 2, first_child = 1, working = 0 }

[[students]]
id = "average"
name = "Average"
features = { gender = 0, parent_education = 0, parent_income = 1, first_child = 0, working = 1 }

[[students]]
id = "poor"
name = "Poor"
features = { gender = 0, parent_education = 0, parent_income = 0, first_child = 0, working = 1 }
"#;
