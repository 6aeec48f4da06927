//! Error types for Policyfile parsing and validation.

use thiserror::Error;

/// Errors that can occur while parsing or querying a policy document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The document is syntactically invalid or structurally inconsistent.
    #[error("malformed document{}: {reason}", at_line(.line))]
    MalformedDocument {
        /// Line where the problem was detected, if it can be pinned to one.
        line: Option<usize>,
        /// Description naming the offending field or path.
        reason: String,
    },

    /// The same cookbook was declared more than once.
    #[error("duplicate dependency '{name}' at line {line}")]
    DuplicateDependency {
        /// Cookbook name.
        name: String,
        /// Line of the second declaration.
        line: usize,
    },

    /// A run list was declared without any recipes.
    #[error("run list '{name}' at line {line} has no recipes")]
    EmptyRunList {
        /// Run-list name (`default` for the plain `run_list`).
        name: String,
        /// Line of the declaration.
        line: usize,
    },

    /// Attribute lookup missed.
    #[error("unknown attribute path: {path}")]
    UnknownAttributePath {
        /// Dotted form of the requested path.
        path: String,
    },
}

impl Error {
    /// Creates a malformed-document error pinned to a line.
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            line: Some(line),
            reason: reason.into(),
        }
    }

    /// Creates a malformed-document error for the document as a whole.
    pub fn malformed_document(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            line: None,
            reason: reason.into(),
        }
    }
}

#[allow(clippy::ref_option)]
fn at_line(line: &Option<usize>) -> String {
    line.map_or_else(String::new, |n| format!(" at line {n}"))
}

/// Result type alias for Policyfile operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_message_includes_line_when_known() {
        let err = Error::malformed(7, "unknown directive 'foo'");
        assert_eq!(
            err.to_string(),
            "malformed document at line 7: unknown directive 'foo'"
        );

        let err = Error::malformed_document("missing required field 'name'");
        assert_eq!(
            err.to_string(),
            "malformed document: missing required field 'name'"
        );
    }
}
