//! Policy lockfile for export verification.
//!
//! The lockfile binds a Policyfile to the export generated from it. It
//! contains:
//! - A hash of the Policyfile source
//! - A hash of the exported output
//! - Metadata about the exported policy

use crate::error::{Error, Result};
use policyfile::PolicyDocument;
use serde::{Deserialize, Serialize};
use std::path::Path;
use xxhash_rust::xxh64::xxh64;

/// Seed for xxhash to ensure deterministic hashing.
const HASH_SEED: u64 = 0x504F_4C49_4359; // "POLICY" in hex

/// Current lockfile format version.
pub const LOCKFILE_VERSION: u32 = 1;

/// A policy lockfile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    /// Version of the lockfile format.
    pub version: u32,
    /// Hash of the Policyfile source.
    pub source_hash: String,
    /// Hash of the exported output.
    pub export_hash: String,
    /// Policy name.
    pub policy_name: String,
    /// Number of cookbook dependencies.
    pub cookbook_count: usize,
    /// Run-list names in the policy.
    pub run_lists: Vec<String>,
    /// Timestamp when the lock was created (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Lockfile {
    /// Creates a new lockfile from a document, its source and its export.
    #[must_use]
    pub fn new(document: &PolicyDocument, source: &str, exported: &str) -> Self {
        Self {
            version: LOCKFILE_VERSION,
            source_hash: hash_content(source),
            export_hash: hash_content(exported),
            policy_name: document.name.clone(),
            cookbook_count: document.dependencies.len(),
            run_lists: document.run_lists.keys().cloned().collect(),
            created_at: None,
        }
    }

    /// Creates a lockfile with a timestamp.
    #[must_use]
    pub fn with_timestamp(mut self) -> Self {
        self.created_at = Some(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
        self
    }

    /// Returns `true` if both the source and export hashes match.
    #[must_use]
    pub fn verify(&self, source: &str, exported: &str) -> bool {
        self.verify_source(source) && self.verify_export(exported)
    }

    /// Returns `true` if the source hash matches.
    #[must_use]
    pub fn verify_source(&self, source: &str) -> bool {
        self.source_hash == hash_content(source)
    }

    /// Returns `true` if the export hash matches.
    #[must_use]
    pub fn verify_export(&self, exported: &str) -> bool {
        self.export_hash == hash_content(exported)
    }

    /// Loads a lockfile from a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it uses
    /// an unsupported format version.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Saves the lockfile to a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        Ok(())
    }

    /// Serializes the lockfile to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a lockfile from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the format version is unknown.
    pub fn from_json(json: &str) -> Result<Self> {
        let lockfile: Self = serde_json::from_str(json)?;
        if lockfile.version != LOCKFILE_VERSION {
            return Err(Error::UnsupportedLockVersion {
                found: lockfile.version,
                expected: LOCKFILE_VERSION,
            });
        }
        Ok(lockfile)
    }
}

/// Derives the default lockfile path for a Policyfile path.
///
/// `Policyfile.rb` becomes `Policyfile.lock.json`.
pub fn lock_path_for(policy_path: &str) -> String {
    format!("{}.lock.json", policy_path.trim_end_matches(".rb"))
}

/// Computes a deterministic hash of content.
fn hash_content(content: &str) -> String {
    let hash = xxh64(content.as_bytes(), HASH_SEED);
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyfile::parse;

    const SOURCE: &str = "name 'web'\ndefault_source :supermarket\ncookbook 'nginx'\nrun_list 'nginx'\n";

    #[test]
    fn hash_is_deterministic() {
        let content = "test content";
        assert_eq!(hash_content(content), hash_content(content));
        assert_eq!(hash_content(content).len(), 16);
    }

    #[test]
    fn different_content_different_hash() {
        assert_ne!(hash_content("content a"), hash_content("content b"));
    }

    #[test]
    fn lockfile_creation() {
        let doc = parse(SOURCE).unwrap();
        let lockfile = Lockfile::new(&doc, SOURCE, "name: web\n");

        assert_eq!(lockfile.version, 1);
        assert_eq!(lockfile.policy_name, "web");
        assert_eq!(lockfile.cookbook_count, 1);
        assert_eq!(lockfile.run_lists, ["default"]);
        assert!(lockfile.created_at.is_none());
    }

    #[test]
    fn lockfile_verification() {
        let doc = parse(SOURCE).unwrap();
        let exported = "exported content";
        let lockfile = Lockfile::new(&doc, SOURCE, exported);

        assert!(lockfile.verify(SOURCE, exported));
        assert!(lockfile.verify_source(SOURCE));
        assert!(lockfile.verify_export(exported));

        let edited = SOURCE.replace("nginx'\nrun", "nginx', '= 1.0'\nrun");
        assert!(!lockfile.verify(&edited, exported));
        assert!(!lockfile.verify(SOURCE, "different"));
    }

    #[test]
    fn lockfile_timestamp_is_rfc3339() {
        let doc = parse(SOURCE).unwrap();
        let lockfile = Lockfile::new(&doc, SOURCE, "").with_timestamp();
        let stamp = lockfile.created_at.unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
        assert!(stamp.ends_with('Z'));
    }

    #[test]
    fn lockfile_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Policyfile.lock.json");

        let doc = parse(SOURCE).unwrap();
        let lockfile = Lockfile::new(&doc, SOURCE, "exported").with_timestamp();
        lockfile.save(&path).unwrap();

        assert_eq!(Lockfile::load(&path).unwrap(), lockfile);
    }

    #[test]
    fn lockfile_rejects_unknown_version() {
        let doc = parse(SOURCE).unwrap();
        let mut lockfile = Lockfile::new(&doc, SOURCE, "");
        lockfile.version = 9;
        let json = lockfile.to_json().unwrap();

        assert!(matches!(
            Lockfile::from_json(&json),
            Err(Error::UnsupportedLockVersion { found: 9, .. })
        ));
    }

    #[test]
    fn lock_path_from_policy_path() {
        assert_eq!(lock_path_for("Policyfile.rb"), "Policyfile.lock.json");
        assert_eq!(lock_path_for("policies/web.rb"), "policies/web.lock.json");
        assert_eq!(lock_path_for("web"), "web.lock.json");
    }
}
