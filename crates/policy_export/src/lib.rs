//! Export of parsed Policyfiles for the resolution engine.
//!
//! This crate is **pure and deterministic** apart from explicit file I/O:
//! - No network calls
//! - No version resolution
//! - Same document always produces the same export
//!
//! # Example
//!
//! ```rust,ignore
//! use policy_export::{Exporter, OutputFormat};
//!
//! let doc = policyfile::parse(&source)?;
//! let yaml = Exporter::new().export(&doc)?;
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

pub mod error;
pub mod export;
pub mod exporter;
pub mod lockfile;
pub mod report;

pub use error::{Error, Result};
pub use export::PolicyExport;
pub use exporter::{export_schema, ExportOptions, Exporter, OutputFormat};
pub use lockfile::Lockfile;
