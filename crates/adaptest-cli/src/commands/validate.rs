//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::parser;

pub fn execute(cohort_path: PathBuf) -> Result<()> {
    let cohorts = if cohort_path.is_dir() {
        parser::load_cohort_directory(&cohort_path)?
    } else {
        vec![parser::parse_cohort(&cohort_path)?]
    };

    let mut total_warnings = 0;

    for cohort in &cohorts {
        println!(
            "Cohort: {} ({} students, {} policy)",
            cohort.name,
            cohort.students.len(),
            cohort.session.policy
        );

        let warnings = parser::validate_cohort(cohort);
        for w in &warnings {
            let prefix = w
                .student_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All cohorts valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
