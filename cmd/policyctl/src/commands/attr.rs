//! Attr command implementation.

use super::load_policy;
use anyhow::{Context, Result};
use policyfile::PolicyDocument;

/// Runs the attr command.
pub fn run(policy_path: &str, path: &str, override_scope: bool) -> Result<()> {
    let (_, document) = load_policy(policy_path)?;
    println!("{}", lookup(&document, path, override_scope)?);
    Ok(())
}

/// Looks up an attribute and renders it as pretty JSON.
pub fn lookup(document: &PolicyDocument, path: &str, override_scope: bool) -> Result<String> {
    let value = if override_scope {
        document.override_attribute(path)
    } else {
        document.attribute(path)
    }?;

    serde_json::to_string_pretty(&serde_json::Value::from(value))
        .with_context(|| format!("Failed to render attribute: {path}"))
}
