//! Schema command implementation.

use anyhow::{Context, Result};

/// Prints the JSON Schema of the export format.
pub fn run() -> Result<()> {
    let schema = policy_export::export_schema().with_context(|| "Failed to build export schema")?;
    println!("{schema}");
    Ok(())
}
