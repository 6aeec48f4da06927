//! Export format types.
//!
//! The layout follows the lock document a Policyfile resolver consumes:
//! run lists are written as `recipe[...]` items, attributes as plain JSON.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Export root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyExport {
    /// Policy name.
    pub name: String,
    /// Default sources in declaration order.
    pub default_source: Vec<ExportSource>,
    /// Cookbook dependencies keyed by name.
    pub cookbooks: BTreeMap<String, ExportCookbook>,
    /// The `default` run list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_list: Vec<String>,
    /// All other run lists.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub named_run_lists: BTreeMap<String, Vec<String>>,
    /// Default attribute tree.
    pub default_attributes: serde_json::Value,
    /// Override attribute tree.
    pub override_attributes: serde_json::Value,
}

/// A default source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportSource {
    /// `supermarket`, `chef_server`, `chef_repo` or `artifactory`.
    #[serde(rename = "type")]
    pub kind: String,
    /// URL or path, when the source has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ExportSource {
    /// Creates a source entry.
    pub fn new(kind: impl Into<String>, location: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            location,
        }
    }
}

/// A cookbook dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportCookbook {
    /// Constraint as written, normalized to `op version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_constraint: Option<String>,
    /// Source override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ExportCookbookSource>,
}

/// A per-cookbook source override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExportCookbookSource {
    /// `supermarket`, `chef_server`, `path`, `git` or `github`.
    #[serde(rename = "type")]
    pub kind: String,
    /// URL, path or `org/repo` slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Git reference as `branch:name`, `tag:name` or `ref:sha`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Subdirectory within the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
}
