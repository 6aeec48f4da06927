//! Subcommand implementations.

pub mod attr;
pub mod check;
pub mod explain;
pub mod export;
pub mod init;
pub mod run_list;
pub mod schema;
pub mod verify;

use anyhow::{Context, Result};
use policyfile::PolicyDocument;
use std::fs;

/// Reads and parses a Policyfile, returning its source text and document.
pub fn load_policy(policy_path: &str) -> Result<(String, PolicyDocument)> {
    let source = fs::read_to_string(policy_path)
        .with_context(|| format!("Failed to read Policyfile: {policy_path}"))?;

    let document = policyfile::parse(&source)
        .with_context(|| format!("Failed to parse Policyfile: {policy_path}"))?;

    Ok((source, document))
}

/// Maps a `--format` value to an output format.
pub fn output_format(format: &str) -> Result<policy_export::OutputFormat> {
    policy_export::OutputFormat::from_name(format)
        .with_context(|| format!("Unknown output format: {format}. Use 'yaml' or 'json'."))
}
