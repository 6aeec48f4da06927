//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Runs the init command.
pub fn run(path: &str, name: &str) -> Result<()> {
    let project_path = Path::new(path);

    info!("Initializing Policyfile at: {}", project_path.display());

    fs::create_dir_all(project_path)
        .with_context(|| format!("Failed to create directory: {}", project_path.display()))?;

    let policy_path = project_path.join("Policyfile.rb");
    if policy_path.exists() {
        info!("Skipped: {} (already exists)", policy_path.display());
    } else {
        fs::write(&policy_path, starter_policy(name))
            .with_context(|| "Failed to create Policyfile.rb")?;
        info!("Created: {}", policy_path.display());
    }

    let gitignore_content = "# Policyctl generated files\nPolicyfile.export.yaml\nPolicyfile.lock.json\nPOLICY.md\n";
    let gitignore_path = project_path.join(".gitignore");
    if gitignore_path.exists() {
        let existing = fs::read_to_string(&gitignore_path).unwrap_or_default();
        if !existing.contains("# Policyctl generated files") {
            let mut content = existing;
            content.push('\n');
            content.push_str(gitignore_content);
            fs::write(&gitignore_path, content).with_context(|| "Failed to update .gitignore")?;
            info!("Updated: {}", gitignore_path.display());
        }
    } else {
        fs::write(&gitignore_path, gitignore_content)
            .with_context(|| "Failed to create .gitignore")?;
        info!("Created: {}", gitignore_path.display());
    }

    info!("Next: edit Policyfile.rb, then run `policyctl check`");
    Ok(())
}

fn starter_policy(name: &str) -> String {
    format!(
        r"# Policyfile.rb - Describe how you want Chef Infra Client to build your system.

# A name that describes what the system you're building with Chef does.
name '{name}'

# Where to find external cookbooks:
default_source :supermarket

# Specify a custom source for a single cookbook:
# cookbook 'example_cookbook', path: '../cookbooks/example_cookbook'

# run_list: chef-client will run these recipes in the order specified.
run_list '{name}::default'
"
    )
}
