//! Structured error types for register loading and updates.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegisterError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("risk {0} not found in register")]
  UnknownRisk(String),

  #[error("io: {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("yaml: {}: {source}", path.display())]
  Yaml {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },
}

impl RegisterError {
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

  pub fn yaml(path: &Path, source: serde_yaml::Error) -> Self {
    Self::Yaml {
      path: path.to_path_buf(),
      source,
    }
  }
}

pub type Result<T> = std::result::Result<T, RegisterError>;
