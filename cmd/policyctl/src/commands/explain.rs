//! Explain command implementation.

use super::load_policy;
use anyhow::{Context, Result};
use policy_export::report::generate_report;
use std::fs;
use tracing::info;

/// Runs the explain command.
pub fn run(policy_path: &str, output_path: &str) -> Result<()> {
    info!("Generating report for: {}", policy_path);

    let (_, document) = load_policy(policy_path)?;
    let report = generate_report(&document);

    fs::write(output_path, &report)
        .with_context(|| format!("Failed to write report: {output_path}"))?;

    info!("Report written to: {}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    #[test]
    fn explain_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let policy = testing::write_policy(dir.path());
        let output = dir.path().join("POLICY.md");

        run(policy.to_str().unwrap(), output.to_str().unwrap()).unwrap();

        let report = fs::read_to_string(output).unwrap();
        assert!(report.starts_with("# Policy Report: web\n"));
        assert!(report.contains("| nginx | `~> 12.0` | default |"));
        assert!(report.contains("(no cookbook pin): inspec\n"));
    }
}
