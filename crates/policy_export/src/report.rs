//! Markdown report generation.
//!
//! The report explains what a Policyfile asks the resolver and the client
//! run to do, for reviewers who do not read Policyfile syntax.

use crate::exporter::undeclared_cookbooks;
use policyfile::{AttributeTree, AttributeValue, PolicyDocument, DEFAULT_RUN_LIST};

/// Generates a human-readable summary of a policy document.
///
/// The report includes:
/// - Policy overview
/// - Sources and cookbook pins
/// - Run lists in execution order
/// - Attribute tables
#[must_use]
pub fn generate_report(document: &PolicyDocument) -> String {
    let mut report = String::new();

    report.push_str(&format!("# Policy Report: {}\n\n", document.name));

    // Overview
    report.push_str("## Overview\n\n");
    report.push_str(&format!("- **Cookbooks**: {}\n", document.dependencies.len()));
    report.push_str(&format!("- **Run lists**: {}\n", document.run_lists.len()));
    report.push_str(&format!(
        "- **Default attributes**: {}\n",
        document.attributes.flatten().len()
    ));
    if !document.override_attributes.is_empty() {
        report.push_str(&format!(
            "- **Override attributes**: {}\n",
            document.override_attributes.flatten().len()
        ));
    }
    report.push('\n');

    // Sources
    report.push_str("## Sources\n\n");
    for source in &document.default_source {
        report.push_str(&format!("- {}\n", source));
    }
    report.push('\n');

    // Cookbooks
    if !document.dependencies.is_empty() {
        report.push_str("## Cookbooks\n\n");
        report.push_str("| Cookbook | Constraint | Source |\n");
        report.push_str("|---|---|---|\n");
        for dependency in &document.dependencies {
            let constraint = dependency
                .constraint
                .as_ref()
                .map_or_else(|| "any".to_string(), ToString::to_string);
            let source = dependency
                .source
                .as_ref()
                .map_or_else(|| "default".to_string(), ToString::to_string);
            report.push_str(&format!(
                "| {} | `{}` | {} |\n",
                dependency.name, constraint, source
            ));
        }
        report.push('\n');
    }

    // Run lists
    if !document.run_lists.is_empty() {
        report.push_str("## Run Lists\n\n");
        report.push_str("Recipes are applied in the order listed.\n\n");
        for (name, recipes) in &document.run_lists {
            let label = if name == DEFAULT_RUN_LIST {
                format!("{} (default)", name)
            } else {
                name.clone()
            };
            report.push_str(&format!("### {}\n\n", label));
            for (i, recipe) in recipes.iter().enumerate() {
                report.push_str(&format!("{}. `{}`\n", i + 1, recipe));
            }
            report.push('\n');
        }

        let undeclared = undeclared_cookbooks(document);
        if !undeclared.is_empty() {
            report.push_str("**Resolved from default sources** (no cookbook pin): ");
            report.push_str(&undeclared.into_iter().collect::<Vec<_>>().join(", "));
            report.push_str("\n\n");
        }
    }

    push_attribute_table(&mut report, "Default Attributes", &document.attributes);
    push_attribute_table(&mut report, "Override Attributes", &document.override_attributes);

    report
}

fn push_attribute_table(report: &mut String, title: &str, tree: &AttributeTree) {
    if tree.is_empty() {
        return;
    }
    report.push_str(&format!("## {}\n\n", title));
    report.push_str("| Path | Value |\n");
    report.push_str("|---|---|\n");
    for (path, value) in tree.flatten() {
        report.push_str(&format!("| `{}` | {} |\n", path, format_value(value)));
    }
    report.push('\n');
}

fn format_value(value: &AttributeValue) -> String {
    let json = serde_json::Value::from(value).to_string();
    format!("`{}`", json.replace('|', "\\|"))
}
