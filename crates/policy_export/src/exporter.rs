//! Main exporter implementation.

use crate::error::{Error, Result};
use crate::export::{ExportCookbook, ExportCookbookSource, ExportSource, PolicyExport};
use policyfile::{
    AttributeTree, AttributeValue, CookbookSource, Dependency, PolicyDocument, SourceDescriptor,
    DEFAULT_RUN_LIST,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Output format for exported policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

impl OutputFormat {
    /// Parses a format name (`yaml`, `yml` or `json`, any case).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Export options.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Prefix YAML output with a provenance comment.
    pub include_comments: bool,
}

/// Exporter that turns a parsed document into the resolver's input format.
///
/// The exporter is **pure and deterministic**:
/// - No network calls
/// - No version resolution
/// - Same input always produces same output
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    options: ExportOptions,
}

impl Exporter {
    /// Creates a new exporter with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new exporter with the given options.
    #[must_use]
    pub const fn with_options(options: ExportOptions) -> Self {
        Self { options }
    }

    /// Exports a document to text.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An attribute holds a non-finite float
    /// - Serialization fails
    pub fn export(&self, document: &PolicyDocument) -> Result<String> {
        let export = self.to_export(document)?;

        match self.options.format {
            OutputFormat::Yaml => {
                let body = serde_yaml::to_string(&export)?;
                if self.options.include_comments {
                    Ok(format!(
                        "# Exported from Policyfile '{}'.\n# Do not edit; regenerate with `policyctl export`.\n{body}",
                        document.name.escape_debug()
                    ))
                } else {
                    Ok(body)
                }
            }
            OutputFormat::Json => serde_json::to_string_pretty(&export).map_err(Error::from),
        }
    }

    /// Converts a document to the export structure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if an attribute holds NaN or an
    /// infinity, which neither output format can represent.
    #[allow(clippy::unused_self)]
    pub fn to_export(&self, document: &PolicyDocument) -> Result<PolicyExport> {
        check_finite(&document.attributes, "default")?;
        check_finite(&document.override_attributes, "override")?;

        for cookbook in undeclared_cookbooks(document) {
            warn!(
                "Run lists use cookbook '{}' without a cookbook declaration; it resolves from the default sources",
                cookbook
            );
        }

        let mut export = PolicyExport {
            name: document.name.clone(),
            default_source: document.default_source.iter().map(export_source).collect(),
            cookbooks: document
                .dependencies
                .iter()
                .map(|d| (d.name.clone(), export_cookbook(d)))
                .collect(),
            run_list: Vec::new(),
            named_run_lists: BTreeMap::new(),
            default_attributes: tree_to_json(&document.attributes),
            override_attributes: tree_to_json(&document.override_attributes),
        };

        for (name, recipes) in &document.run_lists {
            let items = recipes.iter().map(|r| format!("recipe[{r}]")).collect();
            if name == DEFAULT_RUN_LIST {
                export.run_list = items;
            } else {
                export.named_run_lists.insert(name.clone(), items);
            }
        }

        debug!(
            "Exported policy '{}' ({} cookbooks, {} named run lists)",
            export.name,
            export.cookbooks.len(),
            export.named_run_lists.len()
        );
        Ok(export)
    }
}

/// Returns the JSON Schema of the export format, pretty-printed.
///
/// # Errors
///
/// Returns an error if the schema cannot be serialized.
pub fn export_schema() -> Result<String> {
    let schema = schemars::schema_for!(PolicyExport);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Cookbooks referenced by run lists that have no `cookbook` declaration.
pub fn undeclared_cookbooks(document: &PolicyDocument) -> BTreeSet<String> {
    document
        .run_lists
        .values()
        .flatten()
        .map(|recipe| recipe.split("::").next().unwrap_or(recipe).to_string())
        .filter(|cookbook| document.dependency(cookbook).is_none())
        .collect()
}

fn export_source(source: &SourceDescriptor) -> ExportSource {
    match source {
        SourceDescriptor::Supermarket { url } => ExportSource::new("supermarket", url.clone()),
        SourceDescriptor::ChefServer { url } => ExportSource::new("chef_server", Some(url.clone())),
        SourceDescriptor::ChefRepo { path } => ExportSource::new("chef_repo", Some(path.clone())),
        SourceDescriptor::Artifactory { url } => {
            ExportSource::new("artifactory", Some(url.clone()))
        }
    }
}

fn export_cookbook(dependency: &Dependency) -> ExportCookbook {
    ExportCookbook {
        version_constraint: dependency.constraint.as_ref().map(ToString::to_string),
        source: dependency.source.as_ref().map(export_cookbook_source),
    }
}

fn export_cookbook_source(source: &CookbookSource) -> ExportCookbookSource {
    let simple = |kind: &str, location: Option<&String>| ExportCookbookSource {
        kind: kind.to_string(),
        location: location.cloned(),
        reference: None,
        rel: None,
    };
    match source {
        CookbookSource::Supermarket { url } => simple("supermarket", url.as_ref()),
        CookbookSource::ChefServer { url } => simple("chef_server", url.as_ref()),
        CookbookSource::Path { path } => simple("path", Some(path)),
        CookbookSource::Git {
            url,
            reference,
            rel,
        } => ExportCookbookSource {
            kind: "git".to_string(),
            location: Some(url.clone()),
            reference: reference
                .as_ref()
                .map(|r| format!("{}:{}", r.keyword(), r.value())),
            rel: rel.clone(),
        },
        CookbookSource::Github {
            repo,
            reference,
            rel,
        } => ExportCookbookSource {
            kind: "github".to_string(),
            location: Some(repo.clone()),
            reference: reference
                .as_ref()
                .map(|r| format!("{}:{}", r.keyword(), r.value())),
            rel: rel.clone(),
        },
    }
}

fn tree_to_json(tree: &AttributeTree) -> serde_json::Value {
    serde_json::Value::Object(
        tree.root()
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
            .collect(),
    )
}

fn check_finite(tree: &AttributeTree, scope: &str) -> Result<()> {
    fn finite(value: &AttributeValue) -> bool {
        match value {
            AttributeValue::Float(f) => f.is_finite(),
            AttributeValue::List(items) => items.iter().all(finite),
            AttributeValue::Map(map) => map.values().all(finite),
            _ => true,
        }
    }

    for (path, value) in tree.flatten() {
        if !finite(value) {
            return Err(Error::Serialization(format!(
                "{scope} attribute '{path}' holds a non-finite float"
            )));
        }
    }
    Ok(())
}
