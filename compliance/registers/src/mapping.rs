//! Control mappings (SOC-2, ISO 27001): read-only reference data.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::Result;
use crate::issue::Issue;
use crate::yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlStatus {
  Implemented,
  NotImplemented,
  NotApplicable,
}

impl ControlStatus {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    let norm: String = s
      .trim()
      .to_ascii_lowercase()
      .chars()
      .map(|c| if c == '_' || c == '-' { ' ' } else { c })
      .collect();
    match norm.as_str() {
      "implemented" => Some(Self::Implemented),
      "not implemented" | "missing" | "planned" => Some(Self::NotImplemented),
      "not applicable" | "n/a" | "na" => Some(Self::NotApplicable),
      _ => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Implemented => "Implemented",
      Self::NotImplemented => "Not Implemented",
      Self::NotApplicable => "Not Applicable",
    }
  }
}

/// One control row. `status` is kept raw so validation can report typos.
#[derive(Debug, Clone, Deserialize)]
pub struct ControlEntry {
  #[serde(alias = "id", default)]
  pub control_id: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub status: String,
  #[serde(default, deserialize_with = "one_or_many")]
  pub evidence: Vec<String>,
}

impl ControlEntry {
  pub fn status(&self) -> Option<ControlStatus> {
    ControlStatus::from_str_loose(&self.status)
  }

  /// Applicable and not implemented (unknown statuses count as gaps).
  pub fn is_gap(&self) -> bool {
    !matches!(
      self.status(),
      Some(ControlStatus::Implemented) | Some(ControlStatus::NotApplicable)
    )
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingSummary {
  #[serde(default)]
  pub total_controls: u32,
  #[serde(default)]
  pub implemented: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlMapping {
  #[serde(default)]
  pub framework: Option<String>,
  #[serde(default)]
  pub controls: Option<Vec<ControlEntry>>,
  #[serde(default)]
  pub summary: Option<MappingSummary>,
}

/// Applicable vs implemented control counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCounts {
  pub total: u32,
  pub implemented: u32,
}

impl ControlMapping {
  pub fn load(path: &Path) -> Result<Self> {
    yaml::read(path)
  }

  pub fn load_optional(path: &Path) -> Result<Option<Self>> {
    yaml::read_optional(path)
  }

  /// Counts from the control list when present, else from the summary block.
  pub fn counts(&self) -> Option<ControlCounts> {
    if let Some(controls) = &self.controls {
      let applicable = controls
        .iter()
        .filter(|c| c.status() != Some(ControlStatus::NotApplicable));
      let mut counts = ControlCounts {
        total: 0,
        implemented: 0,
      };
      for c in applicable {
        counts.total += 1;
        if c.status() == Some(ControlStatus::Implemented) {
          counts.implemented += 1;
        }
      }
      return Some(counts);
    }
    self.summary.as_ref().map(|s| ControlCounts {
      total: s.total_controls,
      implemented: s.implemented.min(s.total_controls),
    })
  }

  /// Applicable controls that are not implemented.
  pub fn gaps(&self) -> Vec<&ControlEntry> {
    self
      .controls
      .iter()
      .flatten()
      .filter(|c| c.is_gap())
      .collect()
  }

  /// Completeness findings for this mapping. `name` prefixes each subject.
  pub fn completeness_issues(&self, name: &str) -> Vec<Issue> {
    let mut issues = Vec::new();

    let controls = match (&self.controls, &self.summary) {
      (None, None) => {
        issues.push(Issue::error(name, "mapping has neither a controls list nor a summary"));
        return issues;
      }
      (None, Some(s)) => {
        if s.implemented > s.total_controls {
          issues.push(Issue::error(
            format!("{}/summary", name),
            format!(
              "implemented ({}) exceeds total_controls ({})",
              s.implemented, s.total_controls
            ),
          ));
        }
        return issues;
      }
      (Some(controls), _) => controls,
    };

    let mut seen = HashSet::new();
    for (idx, c) in controls.iter().enumerate() {
      if c.control_id.trim().is_empty() {
        issues.push(Issue::error(
          format!("{}/controls[{}]", name, idx),
          "missing control_id",
        ));
        continue;
      }
      let subject = format!("{}/{}", name, c.control_id);
      if !seen.insert(c.control_id.as_str()) {
        issues.push(Issue::error(&subject, "duplicate control_id"));
      }
      if c.description.trim().is_empty() {
        issues.push(Issue::warning(&subject, "missing description"));
      }
      match c.status() {
        None => issues.push(Issue::error(
          &subject,
          format!(
            "invalid status '{}' (expected Implemented|Not Implemented|Not Applicable)",
            c.status
          ),
        )),
        Some(ControlStatus::Implemented) if c.evidence.iter().all(|e| e.trim().is_empty()) => {
          issues.push(Issue::error(&subject, "implemented control has no evidence reference"))
        }
        _ => {}
      }
    }

    if let (Some(summary), Some(counts)) = (&self.summary, self.counts()) {
      if summary.total_controls != counts.total || summary.implemented != counts.implemented {
        issues.push(Issue::warning(
          format!("{}/summary", name),
          format!(
            "summary says {}/{} but controls list has {}/{}",
            summary.implemented, summary.total_controls, counts.implemented, counts.total
          ),
        ));
      }
    }

    issues
  }
}

fn one_or_many<'de, D>(de: D) -> std::result::Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
    Null(()),
  }

  Ok(match OneOrMany::deserialize(de)? {
    OneOrMany::One(s) => vec![s],
    OneOrMany::Many(v) => v,
    OneOrMany::Null(()) => Vec::new(),
  })
}
