//! Output formats for a [`ScoreResult`].
//!
//! Renderers are pure: the timestamp is passed in, so the same result and
//! `generated_at` always render to the same text.

mod badge;
mod json;
mod markdown;
mod table;

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::ScoreError;
use crate::types::ScoreResult;

pub use badge::render_badge;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
  Table,
  Json,
  Markdown,
  Badge,
}

impl ReportFormat {
  /// Format implied by a report path: `.json`, `.md`, `.svg`, else table.
  pub fn from_path(path: &Path) -> Self {
    match path
      .extension()
      .and_then(|e| e.to_str())
      .map(|e| e.to_ascii_lowercase())
      .as_deref()
    {
      Some("json") => Self::Json,
      Some("md") | Some("markdown") => Self::Markdown,
      Some("svg") => Self::Badge,
      _ => Self::Table,
    }
  }
}

impl FromStr for ReportFormat {
  type Err = ScoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "table" | "text" => Ok(Self::Table),
      "json" => Ok(Self::Json),
      "markdown" | "md" => Ok(Self::Markdown),
      "badge" | "svg" => Ok(Self::Badge),
      other => Err(ScoreError::validation(
        "format",
        &format!("unknown report format '{}'", other),
      )),
    }
  }
}

pub fn render(
  result: &ScoreResult,
  format: ReportFormat,
  generated_at: DateTime<Utc>,
) -> Result<String, ScoreError> {
  match format {
    ReportFormat::Table => Ok(table::render_table(result, generated_at)),
    ReportFormat::Json => json::render_json(result, generated_at),
    ReportFormat::Markdown => Ok(markdown::render_markdown(result, generated_at)),
    ReportFormat::Badge => Ok(render_badge(result)),
  }
}

pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
pub(crate) mod fixture {
  use crate::config::ScoreConfig;
  use crate::score::compute;
  use crate::types::{CategoryData, Gap, Inputs, ScoreResult};
  use chrono::{DateTime, TimeZone, Utc};

  pub fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
  }

  /// 25/20/20/15/10/10 over 100/80/50/100/100/100, which scores 86.
  pub fn result() -> ScoreResult {
    let mut inputs = Inputs::new();
    inputs.insert("soc2_controls".into(), CategoryData::counts(10, 10));
    inputs.insert(
      "iso27001_controls".into(),
      CategoryData::counts(10, 8).with_gaps(vec![
        Gap::new("iso27001_controls", "A.5.1", "Policies for information security"),
        Gap::new("iso27001_controls", "A.8.2", "Privileged access rights"),
      ]),
    );
    inputs.insert("risk_management".into(), CategoryData::counts(4, 2));
    inputs.insert("evidence_collection".into(), CategoryData::counts(200, 200));
    inputs.insert("cicd_compliance".into(), CategoryData::counts(5, 5));
    inputs.insert("questionnaire_readiness".into(), CategoryData::counts(0, 0));
    compute(&ScoreConfig::default(), &inputs).unwrap()
  }
}
