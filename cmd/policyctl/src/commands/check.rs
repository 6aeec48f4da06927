//! Check command implementation.

use super::load_policy;
use anyhow::Result;
use policyfile::PolicyDocument;
use tracing::info;

/// Runs the check command.
pub fn run(policy_path: &str) -> Result<()> {
    info!("Checking Policyfile: {}", policy_path);

    let (_, document) = load_policy(policy_path)?;
    println!("{}", summary(&document));

    Ok(())
}

/// One-line summary of a valid document.
pub fn summary(document: &PolicyDocument) -> String {
    let run_lists: Vec<&str> = document.run_lists.keys().map(String::as_str).collect();
    format!(
        "Policy '{}' OK: {} source(s), {} cookbook(s), run lists [{}], {} default / {} override attribute(s)",
        document.name,
        document.default_source.len(),
        document.dependencies.len(),
        run_lists.join(", "),
        document.attributes.flatten().len(),
        document.override_attributes.flatten().len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    #[test]
    fn summary_counts_document_parts() {
        let document = policyfile::parse(testing::POLICY).unwrap();
        assert_eq!(
            summary(&document),
            "Policy 'web' OK: 1 source(s), 1 cookbook(s), run lists [audit, default], 1 default / 1 override attribute(s)"
        );
    }

    #[test]
    fn check_fails_on_duplicate_cookbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Policyfile.rb");
        std::fs::write(
            &path,
            "name 'x'\ndefault_source :supermarket\ncookbook 'a'\ncookbook 'a'\n",
        )
        .unwrap();

        let err = run(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<policyfile::Error>(),
            Some(policyfile::Error::DuplicateDependency { .. })
        ));
    }

    #[test]
    fn check_accepts_valid_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = testing::write_policy(dir.path());
        run(path.to_str().unwrap()).unwrap();
    }
}
