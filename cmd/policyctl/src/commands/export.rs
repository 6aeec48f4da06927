//! Export command implementation.

use super::{load_policy, output_format};
use anyhow::{Context, Result};
use policy_export::lockfile::lock_path_for;
use policy_export::{ExportOptions, Exporter, Lockfile};
use std::fs;
use tracing::info;

/// Runs the export command.
pub fn run(policy_path: &str, output_path: &str, format: &str, create_lockfile: bool) -> Result<()> {
    info!("Exporting Policyfile: {}", policy_path);

    let (source, document) = load_policy(policy_path)?;
    let exporter = Exporter::with_options(ExportOptions {
        format: output_format(format)?,
        include_comments: true,
    });
    let output = exporter
        .export(&document)
        .with_context(|| "Failed to export policy")?;

    if output_path == "-" {
        print!("{output}");
    } else {
        fs::write(output_path, &output)
            .with_context(|| format!("Failed to write output file: {output_path}"))?;
        info!("Export written to: {}", output_path);
    }

    if create_lockfile {
        let lockfile = Lockfile::new(&document, &source, &output).with_timestamp();
        let lock_path = lock_path_for(policy_path);
        lockfile
            .save(&lock_path)
            .with_context(|| format!("Failed to write lockfile: {lock_path}"))?;
        info!("Lockfile written to: {}", lock_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use policy_export::PolicyExport;

    #[test]
    fn export_writes_yaml_and_lockfile() {
        let dir = tempfile::tempdir().unwrap();
        let policy = testing::write_policy(dir.path());
        let output = dir.path().join("Policyfile.export.yaml");

        run(
            policy.to_str().unwrap(),
            output.to_str().unwrap(),
            "yaml",
            true,
        )
        .unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("# Exported from Policyfile 'web'."));
        let export: PolicyExport = serde_yaml::from_str(&text).unwrap();
        assert_eq!(export.run_list, ["recipe[nginx::default]"]);

        let lockfile = Lockfile::load(dir.path().join("Policyfile.lock.json")).unwrap();
        assert_eq!(lockfile.policy_name, "web");
        assert!(lockfile.verify(testing::POLICY, &text));
    }

    #[test]
    fn export_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let policy = testing::write_policy(dir.path());
        let output = dir.path().join("export.json");

        run(
            policy.to_str().unwrap(),
            output.to_str().unwrap(),
            "json",
            false,
        )
        .unwrap();

        let export: PolicyExport =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(export.name, "web");
        assert!(!dir.path().join("Policyfile.lock.json").exists());
    }

    #[test]
    fn export_rejects_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let policy = testing::write_policy(dir.path());
        let output = dir.path().join("out.toml");

        assert!(run(policy.to_str().unwrap(), output.to_str().unwrap(), "toml", false).is_err());
        assert!(!output.exists());
    }
}
