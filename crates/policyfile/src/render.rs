//! Renders a [`PolicyDocument`] back to Policyfile syntax.
//!
//! Output is canonical: single-quoted strings, one directive per line, and
//! attributes written as one assignment per leaf in key order. Parsing the
//! output yields a document equal to the input.

use crate::attributes::{AttributeTree, AttributeValue};
use crate::model::{CookbookSource, Dependency, PolicyDocument, SourceDescriptor, DEFAULT_RUN_LIST};
use std::fmt::Write;

/// Serializes a [`PolicyDocument`] to Policyfile text.
pub fn render(document: &PolicyDocument) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "name {}", quote(&document.name));

    output.push('\n');
    for source in &document.default_source {
        let _ = writeln!(output, "default_source {}", render_source(source));
    }

    if !document.dependencies.is_empty() {
        output.push('\n');
        for dependency in &document.dependencies {
            let _ = writeln!(output, "cookbook {}", render_dependency(dependency));
        }
    }

    if !document.run_lists.is_empty() {
        output.push('\n');
        if let Some(recipes) = document.run_lists.get(DEFAULT_RUN_LIST) {
            let _ = writeln!(output, "run_list {}", render_recipes(recipes));
        }
        for (name, recipes) in &document.run_lists {
            if name == DEFAULT_RUN_LIST {
                continue;
            }
            let _ = writeln!(
                output,
                "named_run_list {}, {}",
                render_run_list_name(name),
                render_recipes(recipes)
            );
        }
    }

    render_attributes(&mut output, "default", &document.attributes);
    render_attributes(&mut output, "override", &document.override_attributes);

    output
}

fn render_source(source: &SourceDescriptor) -> String {
    match source {
        SourceDescriptor::Supermarket { url: None } => ":supermarket".to_string(),
        SourceDescriptor::Supermarket { url: Some(url) } => format!(":supermarket, {}", quote(url)),
        SourceDescriptor::ChefServer { url } => format!(":chef_server, {}", quote(url)),
        SourceDescriptor::ChefRepo { path } => format!(":chef_repo, {}", quote(path)),
        SourceDescriptor::Artifactory { url } => format!(":artifactory, {}", quote(url)),
    }
}

fn render_dependency(dependency: &Dependency) -> String {
    let mut parts = vec![quote(&dependency.name)];
    if let Some(constraint) = &dependency.constraint {
        parts.push(quote(&constraint.to_string()));
    }
    match &dependency.source {
        None => {}
        Some(CookbookSource::Supermarket { url: None }) => parts.push(":supermarket".to_string()),
        Some(CookbookSource::Supermarket { url: Some(url) }) => {
            parts.push(format!("supermarket: {}", quote(url)));
        }
        Some(CookbookSource::ChefServer { url: None }) => parts.push(":chef_server".to_string()),
        Some(CookbookSource::ChefServer { url: Some(url) }) => {
            parts.push(format!("chef_server: {}", quote(url)));
        }
        Some(CookbookSource::Path { path }) => parts.push(format!("path: {}", quote(path))),
        Some(CookbookSource::Git {
            url,
            reference,
            rel,
        }) => {
            parts.push(format!("git: {}", quote(url)));
            push_git_options(&mut parts, reference.as_ref(), rel.as_deref());
        }
        Some(CookbookSource::Github {
            repo,
            reference,
            rel,
        }) => {
            parts.push(format!("github: {}", quote(repo)));
            push_git_options(&mut parts, reference.as_ref(), rel.as_deref());
        }
    }
    parts.join(", ")
}

fn push_git_options(
    parts: &mut Vec<String>,
    reference: Option<&crate::model::GitReference>,
    rel: Option<&str>,
) {
    if let Some(reference) = reference {
        parts.push(format!("{}: {}", reference.keyword(), quote(reference.value())));
    }
    if let Some(rel) = rel {
        parts.push(format!("rel: {}", quote(rel)));
    }
}

fn render_recipes(recipes: &[String]) -> String {
    recipes
        .iter()
        .map(|r| quote(r))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_run_list_name(name: &str) -> String {
    let is_symbol = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_symbol {
        format!(":{name}")
    } else {
        quote(name)
    }
}

fn render_attributes(output: &mut String, scope: &str, tree: &AttributeTree) {
    if tree.is_empty() {
        return;
    }
    output.push('\n');
    for (path, value) in tree.leaves() {
        let _ = write!(output, "{scope}");
        for segment in path.segments() {
            let _ = write!(output, "[{}]", quote(segment));
        }
        let _ = writeln!(output, " = {}", render_value(value));
    }
}

fn render_value(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Null => "nil".to_string(),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Integer(n) => n.to_string(),
        AttributeValue::Float(f) => format!("{f:?}"),
        AttributeValue::String(s) => quote(s),
        AttributeValue::List(items) => format!(
            "[{}]",
            items.iter().map(render_value).collect::<Vec<_>>().join(", ")
        ),
        AttributeValue::Map(map) if map.is_empty() => "{}".to_string(),
        AttributeValue::Map(map) => format!(
            "{{ {} }}",
            map.iter()
                .map(|(k, v)| format!("{} => {}", quote(k), render_value(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Single-quotes a string, escaping backslashes and quotes.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
