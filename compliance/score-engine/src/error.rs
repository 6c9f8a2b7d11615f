//! Structured error types for the score engine.

use compliance_registers::RegisterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error(transparent)]
  Source(#[from] RegisterError),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl ScoreError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }
}
