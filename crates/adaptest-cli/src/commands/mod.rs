pub mod cohort;
pub mod init;
pub mod render;
pub mod run;
pub mod validate;

use anyhow::Result;

/// Split a `--format` value into known format names. `all` expands to
/// every entry of `known`.
pub fn parse_formats<'a>(format: &'a str, known: &[&'a str]) -> Result<Vec<&'a str>> {
    if format.trim() == "all" {
        return Ok(known.to_vec());
    }
    let formats: Vec<&str> = format
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    for fmt in &formats {
        anyhow::ensure!(
            known.contains(fmt),
            "unknown format '{fmt}' (expected one of: {}, all)",
            known.join(", ")
        );
    }
    Ok(formats)
}
