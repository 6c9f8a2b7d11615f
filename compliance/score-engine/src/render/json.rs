use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ScoreError;
use crate::types::ScoreResult;

#[derive(Serialize)]
struct JsonReport<'a> {
  generated_at: String,
  #[serde(flatten)]
  result: &'a ScoreResult,
}

pub(super) fn render_json(
  result: &ScoreResult,
  generated_at: DateTime<Utc>,
) -> Result<String, ScoreError> {
  let report = JsonReport {
    generated_at: super::timestamp(generated_at),
    result,
  };
  Ok(serde_json::to_string_pretty(&report)?)
}
