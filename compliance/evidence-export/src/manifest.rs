//! `MANIFEST.json`: what the package contains and the hash of each file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const MANIFEST_NAME: &str = "MANIFEST.json";
pub const README_NAME: &str = "README.txt";
pub const MANIFEST_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
  pub path: String,
  pub sha256: String,
  pub size_bytes: u64,
  /// File mtime, RFC 3339 UTC.
  pub modified: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMetadata {
  pub generated: String,
  pub generator: String,
  pub version: String,
  pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
  pub files_included: usize,
  pub files_missing: usize,
  #[serde(default)]
  pub files_rejected: usize,
  pub total_expected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
  pub metadata: ManifestMetadata,
  pub statistics: Statistics,
  pub files: Vec<FileRecord>,
  #[serde(default)]
  pub missing_files: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub rejected_files: Vec<String>,
  #[serde(default)]
  pub evidence_categories: BTreeMap<String, Vec<String>>,
}

impl Manifest {
  pub fn find(&self, path: &str) -> Option<&FileRecord> {
    self.files.iter().find(|f| f.path == path)
  }
}
