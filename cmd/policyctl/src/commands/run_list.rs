//! Run-list command implementation.

use super::load_policy;
use anyhow::Result;
use policyfile::PolicyDocument;

/// Runs the run-list command, printing one recipe per line.
pub fn run(policy_path: &str, name: &str) -> Result<()> {
    let (_, document) = load_policy(policy_path)?;
    for recipe in recipes(&document, name)? {
        println!("{recipe}");
    }
    Ok(())
}

/// Returns the recipes of the named run list.
pub fn recipes<'a>(document: &'a PolicyDocument, name: &str) -> Result<&'a [String]> {
    match document.run_list(name) {
        Some(recipes) => Ok(recipes),
        None => {
            let known: Vec<&str> = document.run_lists.keys().map(String::as_str).collect();
            anyhow::bail!(
                "Policy '{}' has no run list '{name}' (known: {})",
                document.name,
                known.join(", ")
            )
        }
    }
}
