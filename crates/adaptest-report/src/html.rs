//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use adaptest_core::report::{CohortReport, SessionReport};
use adaptest_core::trace::TraceRecord;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn page_head(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>adaptest report: {}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn page_tail(html: &mut String, raw: String) {
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&raw.replace('<', "&lt;").replace('>', "&gt;"));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");
    html.push_str("</body>\n</html>");
}

fn outcome_text(report: &SessionReport) -> String {
    report
        .termination_reason
        .map_or_else(|| "not finished".to_string(), |r| r.to_string())
}

/// Generate an HTML report for a single session.
pub fn generate_html(report: &SessionReport) -> String {
    let title = report.label.as_deref().unwrap_or("session");
    let mut html = String::new();
    page_head(&mut html, title);

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>adaptest session report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Student: <strong>{}</strong> | {} mode | {} policy | seed {} | {}</p>\n",
        html_escape(title),
        report.mode,
        report.policy,
        report.seed,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Final score</th><th>Target</th><th>Questions</th><th>Limit</th><th>Ability estimate</th><th>Outcome</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    let ability = report
        .ability_estimate
        .map_or_else(|| "-".to_string(), |a| format!("{a:.1}"));
    html.push_str(&format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
        report.final_score,
        report.target_score,
        report.questions_asked,
        report.max_questions,
        ability,
        outcome_text(report),
    ));
    html.push_str("</tbody></table>\n");

    if !report.attempts.is_empty() {
        html.push_str(&generate_score_chart(&report.attempts, report.target_score));
    }
    html.push_str("</section>\n");

    // Per-attempt results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Attempts</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Level</th><th onclick=\"sortTable(2)\">Answer</th><th onclick=\"sortTable(3)\">Points</th><th onclick=\"sortTable(4)\">Total</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for r in &report.attempts {
        let class = if r.correct { "pass" } else { "fail" };
        let text = if r.correct { "correct" } else { "incorrect" };
        html.push_str(&format!(
            "<tr class=\"{class}\"><td>{}</td><td>{}</td><td class=\"{class}\">{text}</td><td>{}</td><td>{}</td></tr>\n",
            r.question_index, r.level, r.points_awarded, r.cumulative_score
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    page_tail(&mut html, serde_json::to_string_pretty(report).unwrap_or_default());
    html
}

/// Generate an HTML report for a cohort run.
pub fn generate_cohort_html(report: &CohortReport) -> String {
    let mut html = String::new();
    page_head(&mut html, &report.cohort.name);

    html.push_str("<header>\n");
    html.push_str("<h1>adaptest cohort report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Cohort: <strong>{}</strong> | {} students | {} sessions | {}</p>\n",
        html_escape(&report.cohort.name),
        report.cohort.student_count,
        report.sessions.len(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    let stats = &report.stats;
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Mean score</th><th>Mean questions</th><th>Target reached</th><th>Duration</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{:.1}</td><td>{:.1}</td><td>{:.1}%</td><td>{}ms</td></tr></tbody></table>\n",
        stats.mean_final_score,
        stats.mean_questions,
        stats.target_reached_rate * 100.0,
        report.duration_ms
    ));

    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Level</th><th>Asked</th><th>Correct</th><th>Accuracy</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (level, s) in &stats.per_level {
        html.push_str(&format!(
            "<tr><td>{level}</td><td>{}</td><td>{}</td><td>{:.1}%</td></tr>\n",
            s.asked,
            s.correct,
            s.accuracy * 100.0
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Sessions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Student</th><th onclick=\"sortTable(1)\">Ability</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Questions</th><th onclick=\"sortTable(4)\">Outcome</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for s in &report.sessions {
        let reached = s.final_score >= s.target_score;
        let class = if reached { "pass" } else { "fail" };
        html.push_str(&format!(
            "<tr class=\"{class}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(s.label.as_deref().unwrap_or("-")),
            s.ability_estimate
                .map_or_else(|| "-".to_string(), |a| format!("{a:.1}")),
            s.final_score,
            s.questions_asked,
            outcome_text(s),
        ));
    }
    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    page_tail(&mut html, serde_json::to_string_pretty(report).unwrap_or_default());
    html
}

/// Write a session HTML report to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    write_file(path, generate_html(report))
}

/// Write a cohort HTML report to a file.
pub fn write_cohort_html_report(report: &CohortReport, path: &Path) -> Result<()> {
    write_file(path, generate_cohort_html(report))
}

fn write_file(path: &Path, html: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

/// Cumulative score per question as a bar chart, with the target as a line.
fn generate_score_chart(attempts: &[TraceRecord], target: u32) -> String {
    let bar_width = 36;
    let padding = 8;
    let chart_height = 200;
    let label_height = 20;

    let peak = attempts
        .iter()
        .map(|a| a.cumulative_score)
        .max()
        .unwrap_or(0)
        .max(target)
        .max(1);
    let scale = |v: u32| (f64::from(v) / f64::from(peak) * chart_height as f64) as usize;

    let total_width = attempts.len() * (bar_width + padding) + padding;
    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        total_width,
        chart_height + label_height * 2
    );

    for (i, a) in attempts.iter().enumerate() {
        let x = i * (bar_width + padding) + padding;
        let height = scale(a.cumulative_score);
        let y = label_height + chart_height - height;
        let color = if a.correct { "#22c55e" } else { "#ef4444" };

        svg.push_str(&format!(
            "  <rect x=\"{x}\" y=\"{y}\" width=\"{bar_width}\" height=\"{height}\" fill=\"{color}\" rx=\"4\"/>\n"
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\">{}</text>\n",
            x + bar_width / 2,
            y.saturating_sub(4).max(12),
            a.cumulative_score
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" text-anchor=\"middle\">Q{} L{}</text>\n",
            x + bar_width / 2,
            label_height + chart_height + 14,
            a.question_index,
            a.level
        ));
    }

    let target_y = label_height + chart_height - scale(target);
    svg.push_str(&format!(
        "  <line x1=\"0\" y1=\"{target_y}\" x2=\"{total_width}\" y2=\"{target_y}\" stroke=\"#6b7280\" stroke-dasharray=\"4 4\"/>\n"
    ));

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use adaptest_core::model::{DifficultyLevel, LevelPolicy, OracleMode, TerminationReason};
    use adaptest_core::report::CohortSummary;
    use adaptest_core::statistics::compute_cohort_stats;

    fn make_session(label: &str, correct: &[bool]) -> SessionReport {
        let levels = DifficultyLevel::ALL;
        let mut score = 0;
        let attempts: Vec<TraceRecord> = correct
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let level = levels[i.min(3)];
                let points = if *c { level.points() } else { 0 };
                score += points;
                TraceRecord {
                    question_index: i as u32 + 1,
                    level,
                    points_awarded: points,
                    cumulative_score: score,
                    correct: *c,
                }
            })
            .collect();
        SessionReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            label: Some(label.into()),
            mode: OracleMode::Simulated,
            policy: LevelPolicy::Weighted,
            seed: 99,
            target_score: 100,
            max_questions: 10,
            ability_estimate: Some(62.5),
            questions_asked: attempts.len() as u32,
            attempts,
            final_score: score,
            termination_reason: Some(TerminationReason::MaxQuestionsReached),
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_session("<bob>", &[true, false, true]);
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("&lt;bob&gt;"));
        assert!(!html.contains("<bob>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("62.5"));
        assert!(html.contains("<td>max questions reached</td>"));
        assert_eq!(html.matches("<tr class=\"").count(), 3);
    }

    #[test]
    fn empty_session_has_no_chart() {
        let html = generate_html(&make_session("empty", &[]));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn cohort_html_lists_sessions() {
        let sessions = vec![
            make_session("excellent", &[true, true, true, true]),
            make_session("poor", &[false, false]),
        ];
        let report = CohortReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            cohort: CohortSummary {
                id: "demo".into(),
                name: "Demo Cohort".into(),
                student_count: 2,
            },
            stats: compute_cohort_stats(&sessions),
            sessions,
            duration_ms: 12,
        };
        let html = generate_cohort_html(&report);

        assert!(html.contains("Demo Cohort"));
        assert!(html.contains("excellent"));
        assert!(html.contains("poor"));
        assert!(html.contains("Accuracy"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_session("alice", &[true]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.html");

        write_html_report(&report, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
