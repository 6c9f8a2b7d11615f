//! Structured error types for the evidence exporter.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("io: {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("zip: {}: {source}", path.display())]
  Zip {
    path: PathBuf,
    #[source]
    source: zip::result::ZipError,
  },

  #[error("yaml: {}: {source}", path.display())]
  Yaml {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl ExportError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn not_found(path: &Path) -> Self {
    Self::NotFound {
      path: path.to_path_buf(),
    }
  }

  pub fn io(path: &Path, source: std::io::Error) -> Self {
    Self::Io {
      path: path.to_path_buf(),
      source,
    }
  }

  pub fn zip(path: &Path, source: zip::result::ZipError) -> Self {
    Self::Zip {
      path: path.to_path_buf(),
      source,
    }
  }
}

pub type Result<T> = std::result::Result<T, ExportError>;
