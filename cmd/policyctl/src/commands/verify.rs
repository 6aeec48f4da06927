//! Verify command implementation.

use super::{load_policy, output_format};
use anyhow::{Context, Result};
use policy_export::lockfile::lock_path_for;
use policy_export::{ExportOptions, Exporter, Lockfile};
use tracing::{info, warn};

/// Runs the verify command.
///
/// Fails when the Policyfile or its export no longer match the lockfile.
pub fn run(policy_path: &str, lock_path: Option<&str>, format: &str) -> Result<()> {
    let lock_path = lock_path.map_or_else(|| lock_path_for(policy_path), ToString::to_string);
    info!("Verifying {} against {}", policy_path, lock_path);

    let (source, document) = load_policy(policy_path)?;
    let lockfile = Lockfile::load(&lock_path)
        .with_context(|| format!("Failed to read lockfile: {lock_path}"))?;

    let exporter = Exporter::with_options(ExportOptions {
        format: output_format(format)?,
        include_comments: true,
    });
    let output = exporter
        .export(&document)
        .with_context(|| "Failed to export policy")?;

    let source_matches = lockfile.verify_source(&source);
    let export_matches = lockfile.verify_export(&output);

    if !source_matches {
        warn!("Source hash mismatch - Policyfile has been modified");
    }
    if !export_matches {
        warn!("Export hash mismatch - export differs from locked version");
    }
    if !(source_matches && export_matches) {
        anyhow::bail!("Policyfile '{}' does not match lockfile {lock_path}", document.name);
    }

    info!("Policyfile '{}' matches lockfile", document.name);
    Ok(())
}
