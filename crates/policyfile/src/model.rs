//! Typed policy document model.
//!
//! A [`PolicyDocument`] is only produced by [`crate::parse`], which enforces
//! the structural invariants: a non-empty name, at least one default source,
//! unique cookbook names, non-empty run lists and attribute paths that stay
//! unique after flattening.

use crate::attributes::{AttributePath, AttributeTree, AttributeValue};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the run list populated by the plain `run_list` directive.
pub const DEFAULT_RUN_LIST: &str = "default";

/// An ordered list of recipe identifiers.
pub type RunList = Vec<String>;

/// A validated policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    /// Policy name.
    pub name: String,
    /// Sources cookbooks are resolved from, in declaration order.
    pub default_source: Vec<SourceDescriptor>,
    /// Cookbook dependencies, in declaration order.
    pub dependencies: Vec<Dependency>,
    /// Run lists by name. The plain `run_list` is stored as `default`.
    pub run_lists: BTreeMap<String, RunList>,
    /// Tree built from `default[...]` assignments.
    pub attributes: AttributeTree,
    /// Tree built from `override[...]` assignments.
    #[serde(default, skip_serializing_if = "AttributeTree::is_empty")]
    pub override_attributes: AttributeTree,
}

impl PolicyDocument {
    /// Creates a document with a name and nothing else.
    ///
    /// The result is not valid until a default source is added.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_source: Vec::new(),
            dependencies: Vec::new(),
            run_lists: BTreeMap::new(),
            attributes: AttributeTree::new(),
            override_attributes: AttributeTree::new(),
        }
    }

    /// Looks up a default attribute.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownAttributePath`] if nothing is stored at
    /// `path`. The miss is not fatal; the document is unchanged.
    pub fn attribute(&self, path: impl Into<AttributePath>) -> Result<&AttributeValue> {
        self.attributes.lookup(&path.into())
    }

    /// Looks up a default attribute, returning `None` on a miss.
    pub fn get_attribute(&self, path: impl Into<AttributePath>) -> Option<&AttributeValue> {
        self.attributes.get(&path.into())
    }

    /// Looks up an override attribute.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownAttributePath`] on a miss.
    pub fn override_attribute(&self, path: impl Into<AttributePath>) -> Result<&AttributeValue> {
        self.override_attributes.lookup(&path.into())
    }

    /// Returns the run list with the given name.
    pub fn run_list(&self, name: &str) -> Option<&[String]> {
        self.run_lists.get(name).map(Vec::as_slice)
    }

    /// Returns the `default` run list.
    pub fn default_run_list(&self) -> Option<&[String]> {
        self.run_list(DEFAULT_RUN_LIST)
    }

    /// Returns the dependency on the named cookbook.
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }

    /// Default attributes flattened to dotted paths.
    pub fn flatten_attributes(&self) -> Vec<(String, &AttributeValue)> {
        self.attributes.flatten()
    }
}

/// Where cookbooks are resolved from unless a dependency overrides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Public or private Supermarket; `None` means the public one.
    Supermarket {
        /// Custom Supermarket URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// A Chef Infra Server.
    ChefServer {
        /// Server URL.
        url: String,
    },
    /// A local cookbook repository.
    ChefRepo {
        /// Repository path.
        path: String,
    },
    /// An Artifactory instance.
    Artifactory {
        /// Artifactory URL.
        url: String,
    },
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supermarket { url: None } => f.write_str("supermarket"),
            Self::Supermarket { url: Some(url) } => write!(f, "supermarket ({url})"),
            Self::ChefServer { url } => write!(f, "chef_server ({url})"),
            Self::ChefRepo { path } => write!(f, "chef_repo ({path})"),
            Self::Artifactory { url } => write!(f, "artifactory ({url})"),
        }
    }
}

/// A cookbook dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Cookbook name, unique within a document.
    pub name: String,
    /// Version constraint; `None` accepts any version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<VersionConstraint>,
    /// Source that overrides the document's default sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CookbookSource>,
}

impl Dependency {
    /// Creates an unconstrained dependency on the default sources.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
            source: None,
        }
    }

    /// Sets the version constraint.
    #[must_use]
    pub fn with_constraint(mut self, constraint: VersionConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    /// Sets the source override.
    #[must_use]
    pub fn with_source(mut self, source: CookbookSource) -> Self {
        self.source = Some(source);
        self
    }
}

/// Comparison operator of a version constraint.
///
/// Only the syntax is modelled here. Matching versions against a constraint
/// is the resolver's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintOperator {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    NotEq,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `~>`
    #[serde(rename = "~>")]
    Pessimistic,
}

impl ConstraintOperator {
    /// Source spelling of the operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Pessimistic => "~>",
        }
    }

    /// Parses an operator token.
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "=" => Self::Eq,
            "!=" => Self::NotEq,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "<" => Self::Lt,
            "<=" => Self::Le,
            "~>" => Self::Pessimistic,
            _ => return None,
        })
    }
}

/// A version constraint split into operator and version text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConstraint {
    /// Comparison operator.
    pub operator: ConstraintOperator,
    /// Version text, 1 to 3 dot-separated numbers.
    pub version: String,
}

impl VersionConstraint {
    /// Creates an `=` constraint.
    #[must_use]
    pub fn exact(version: impl Into<String>) -> Self {
        Self {
            operator: ConstraintOperator::Eq,
            version: version.into(),
        }
    }

    /// Returns true for an `=` constraint.
    pub const fn is_exact(&self) -> bool {
        matches!(self.operator, ConstraintOperator::Eq)
    }

    /// Splits `"= 0.18.1"`, `"~>1.2"` or a bare `"1.2.3"`.
    ///
    /// Returns a description of the problem on failure; the parser attaches
    /// the line.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let text = text.trim();
        let split = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| format!("version constraint '{text}' has no version"))?;
        let (op, version) = text.split_at(split);
        let op = op.trim();
        let operator = if op.is_empty() {
            ConstraintOperator::Eq
        } else {
            ConstraintOperator::from_token(op)
                .ok_or_else(|| format!("unknown constraint operator '{op}' in '{text}'"))?
        };

        let parts: Vec<&str> = version.split('.').collect();
        let well_formed = parts.len() <= 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
        if !well_formed {
            return Err(format!("invalid version '{version}' in constraint '{text}'"));
        }

        Ok(Self {
            operator,
            version: version.to_string(),
        })
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator.as_str(), self.version)
    }
}

/// Git reference pinned by a git or GitHub cookbook source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitReference {
    /// `branch:`
    Branch(String),
    /// `tag:`
    Tag(String),
    /// `ref:`
    Ref(String),
}

impl GitReference {
    /// Keyword used in the source syntax.
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Branch(_) => "branch",
            Self::Tag(_) => "tag",
            Self::Ref(_) => "ref",
        }
    }

    /// Referenced name.
    pub fn value(&self) -> &str {
        match self {
            Self::Branch(v) | Self::Tag(v) | Self::Ref(v) => v,
        }
    }
}

/// Per-cookbook source override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CookbookSource {
    /// `:supermarket` or `supermarket: "url"`.
    Supermarket {
        /// Custom Supermarket URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// `:chef_server` or `chef_server: "url"`.
    ChefServer {
        /// Server URL.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// `path: "..."`
    Path {
        /// Local path.
        path: String,
    },
    /// `git: "..."`
    Git {
        /// Repository URL.
        url: String,
        /// Branch, tag or ref.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<GitReference>,
        /// Subdirectory holding the cookbook.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rel: Option<String>,
    },
    /// `github: "org/repo"`
    Github {
        /// `org/repo` slug.
        repo: String,
        /// Branch, tag or ref.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reference: Option<GitReference>,
        /// Subdirectory holding the cookbook.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rel: Option<String>,
    },
}

impl fmt::Display for CookbookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supermarket { url: None } => f.write_str("supermarket"),
            Self::Supermarket { url: Some(url) } => write!(f, "supermarket ({url})"),
            Self::ChefServer { url: None } => f.write_str("chef_server"),
            Self::ChefServer { url: Some(url) } => write!(f, "chef_server ({url})"),
            Self::Path { path } => write!(f, "path {path}"),
            Self::Git { url, reference, .. } => {
                write!(f, "git {url}")?;
                if let Some(r) = reference {
                    write!(f, " ({} {})", r.keyword(), r.value())?;
                }
                Ok(())
            }
            Self::Github { repo, reference, .. } => {
                write!(f, "github {repo}")?;
                if let Some(r) = reference {
                    write!(f, " ({} {})", r.keyword(), r.value())?;
                }
                Ok(())
            }
        }
    }
}
