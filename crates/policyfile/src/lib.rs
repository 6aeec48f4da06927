//! Policyfile parsing and typed policy document model.
//!
//! This crate provides:
//! - Parsing of Policyfile documents with strict structural validation
//! - A typed [`PolicyDocument`] with an explicit attribute tree
//! - Rendering of documents back to canonical Policyfile text
//!
//! Resolving cookbook versions and applying run lists are left to the
//! engine that consumes the parsed document.
//!
//! # Example
//!
//! ```rust,ignore
//! use policyfile::parse;
//!
//! let doc = parse(&std::fs::read_to_string("Policyfile.rb")?)?;
//! let license = doc.attribute("chef-server.accept_license")?;
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod attributes;
pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod render;

pub use attributes::{AttributePath, AttributeTree, AttributeValue};
pub use error::{Error, Result};
pub use model::{
    ConstraintOperator, CookbookSource, Dependency, GitReference, PolicyDocument, RunList,
    SourceDescriptor, VersionConstraint, DEFAULT_RUN_LIST,
};
pub use parser::parse;
pub use render::render;
