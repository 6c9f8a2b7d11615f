//! SOC-2 Type II evidence log: append-only record of control operation events.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{RegisterError, Result};
use crate::yaml;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogMetadata {
  #[serde(default)]
  pub created: String,
  #[serde(default)]
  pub last_updated: String,
  #[serde(default)]
  pub total_entries: usize,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceEntry {
  #[serde(default)]
  pub timestamp: String,
  #[serde(alias = "control_id", default)]
  pub control: String,
  #[serde(default)]
  pub event: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repo: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reference: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub actor: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub details: Option<Value>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// Fields supplied by the caller when recording evidence; the timestamp is stamped on append.
#[derive(Debug, Clone, Default)]
pub struct NewEvidence {
  pub control: String,
  pub event: String,
  pub repo: Option<String>,
  pub reference: Option<String>,
  pub actor: Option<String>,
  pub details: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceLog {
  #[serde(default)]
  pub metadata: LogMetadata,
  #[serde(default)]
  pub evidence_log: Vec<EvidenceEntry>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvidenceStats {
  pub total: usize,
  pub by_control: BTreeMap<String, usize>,
  pub by_repo: BTreeMap<String, usize>,
  /// Earliest and latest entry dates (YYYY-MM-DD), when any entry has a timestamp.
  pub date_range: Option<(String, String)>,
}

fn stamp(ts: DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Short descriptions for the common SOC-2 common criteria.
pub fn control_description(control: &str) -> &'static str {
  match control {
    "CC6.1" => "Logical access security",
    "CC6.2" => "Authentication and authorization",
    "CC6.6" => "Change management",
    "CC6.7" => "Infrastructure changes",
    "CC7.1" => "System monitoring",
    "CC7.2" => "Incident response",
    "CC7.3" => "Change evaluation",
    "CC8.1" => "Change authorization",
    _ => "Other control",
  }
}

impl EvidenceLog {
  pub fn empty(now: DateTime<Utc>) -> Self {
    Self {
      metadata: LogMetadata {
        created: stamp(now),
        last_updated: stamp(now),
        total_entries: 0,
        extra: BTreeMap::new(),
      },
      evidence_log: Vec::new(),
      extra: BTreeMap::new(),
    }
  }

  pub fn load(path: &Path) -> Result<Self> {
    yaml::read(path)
  }

  pub fn load_optional(path: &Path) -> Result<Option<Self>> {
    yaml::read_optional(path)
  }

  /// Load the log, or start a fresh one when the file does not exist yet.
  pub fn load_or_empty(path: &Path, now: DateTime<Utc>) -> Result<Self> {
    Ok(Self::load_optional(path)?.unwrap_or_else(|| Self::empty(now)))
  }

  pub fn len(&self) -> usize {
    self.evidence_log.len()
  }

  pub fn is_empty(&self) -> bool {
    self.evidence_log.is_empty()
  }

  /// Append one entry. Existing entries are never touched.
  pub fn append(&mut self, new: NewEvidence, now: DateTime<Utc>) -> Result<&EvidenceEntry> {
    if new.control.trim().is_empty() {
      return Err(RegisterError::validation("control", "must not be empty"));
    }
    if new.event.trim().is_empty() {
      return Err(RegisterError::validation("event", "must not be empty"));
    }

    let details = if new.details.is_empty() {
      None
    } else {
      let map = new
        .details
        .into_iter()
        .map(|(k, v)| (Value::String(k), Value::String(v)))
        .collect();
      Some(Value::Mapping(map))
    };

    self.evidence_log.push(EvidenceEntry {
      timestamp: stamp(now),
      control: new.control,
      event: new.event,
      repo: new.repo,
      reference: new.reference,
      actor: new.actor,
      details,
      extra: BTreeMap::new(),
    });
    let entry = &self.evidence_log[self.evidence_log.len() - 1];
    tracing::info!(control = %entry.control, event = %entry.event, "evidence recorded");
    Ok(entry)
  }

  pub fn save(&mut self, path: &Path, now: DateTime<Utc>) -> Result<()> {
    if self.metadata.created.is_empty() {
      self.metadata.created = stamp(now);
    }
    self.metadata.last_updated = stamp(now);
    self.metadata.total_entries = self.evidence_log.len();
    yaml::write(path, self)
  }

  /// Load, append and save in one step.
  pub fn record(path: &Path, new: NewEvidence, now: DateTime<Utc>) -> Result<EvidenceEntry> {
    let mut log = Self::load_or_empty(path, now)?;
    let entry = log.append(new, now)?.clone();
    log.save(path, now)?;
    Ok(entry)
  }

  pub fn statistics(&self) -> EvidenceStats {
    let mut by_control = BTreeMap::new();
    let mut by_repo = BTreeMap::new();
    for e in &self.evidence_log {
      let control = if e.control.is_empty() { "unknown" } else { e.control.as_str() };
      *by_control.entry(control.to_string()).or_insert(0) += 1;
      let repo = e.repo.as_deref().unwrap_or("unknown");
      *by_repo.entry(repo.to_string()).or_insert(0) += 1;
    }

    let mut dates: Vec<&str> = self
      .evidence_log
      .iter()
      .filter(|e| !e.timestamp.is_empty())
      .map(|e| e.timestamp.get(..10).unwrap_or(&e.timestamp))
      .collect();
    dates.sort_unstable();
    let date_range = match (dates.first(), dates.last()) {
      (Some(first), Some(last)) => Some((first.to_string(), last.to_string())),
      _ => None,
    };

    EvidenceStats {
      total: self.evidence_log.len(),
      by_control,
      by_repo,
      date_range,
    }
  }

  /// Markdown Type II summary report.
  pub fn render_report(&self, now: DateTime<Utc>) -> String {
    let stats = self.statistics();
    let (earliest, latest) = stats
      .date_range
      .clone()
      .unwrap_or_else(|| ("N/A".to_string(), "N/A".to_string()));

    let mut lines = vec![
      "# SOC-2 Type II Evidence Report".to_string(),
      String::new(),
      format!("**Generated:** {} UTC", now.format("%Y-%m-%d %H:%M:%S")),
      String::new(),
      "---".to_string(),
      String::new(),
      "## Executive Summary".to_string(),
      String::new(),
      format!("- **Total Evidence Entries:** {}", stats.total),
      format!("- **Date Range:** {} to {}", earliest, latest),
      format!("- **Controls Covered:** {}", stats.by_control.len()),
      format!("- **Repositories:** {}", stats.by_repo.len()),
      String::new(),
      "---".to_string(),
      String::new(),
      "## Evidence by Control".to_string(),
      String::new(),
    ];

    if stats.by_control.is_empty() {
      lines.push("*No evidence collected yet.*".to_string());
    } else {
      lines.push("| Control | Description | Evidence Count |".to_string());
      lines.push("|---------|-------------|----------------|".to_string());
      for (control, count) in &stats.by_control {
        lines.push(format!(
          "| {} | {} | {} |",
          control,
          control_description(control),
          count
        ));
      }
    }

    lines.extend([
      String::new(),
      "---".to_string(),
      String::new(),
      "## Recent Evidence".to_string(),
      String::new(),
    ]);
    if self.evidence_log.is_empty() {
      lines.push("*No evidence collected yet.*".to_string());
    } else {
      lines.push("| Timestamp | Control | Event | Reference |".to_string());
      lines.push("|-----------|---------|-------|-----------|".to_string());
      for e in self.evidence_log.iter().rev().take(20) {
        lines.push(format!(
          "| {} | {} | {} | {} |",
          e.timestamp,
          e.control,
          e.event,
          e.reference.as_deref().unwrap_or("")
        ));
      }
    }

    lines.join("\n")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
  }

  fn new(control: &str, repo: &str) -> NewEvidence {
    NewEvidence {
      control: control.into(),
      event: "PR merged".into(),
      repo: Some(repo.into()),
      reference: Some("PR #12".into()),
      actor: None,
      details: BTreeMap::new(),
    }
  }

  #[test]
  fn append_stamps_timestamp() {
    let mut log = EvidenceLog::empty(at(1));
    let entry = log.append(new("CC6.6", "api"), at(2)).unwrap();
    assert_eq!(entry.timestamp, "2026-10-02T12:00:00Z");
    assert_eq!(log.len(), 1);
  }

  #[test]
  fn append_rejects_empty_control() {
    let mut log = EvidenceLog::empty(at(1));
    let err = log.append(new("  ", "api"), at(2)).unwrap_err();
    assert!(err.to_string().contains("control"));
    assert!(log.is_empty());
  }

  #[test]
  fn record_appends_without_rewriting_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.yaml");
    EvidenceLog::record(&path, new("CC6.6", "api"), at(3)).unwrap();
    EvidenceLog::record(&path, new("CC7.2", "web"), at(5)).unwrap();

    let log = EvidenceLog::load(&path).unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log.metadata.total_entries, 2);
    assert_eq!(log.metadata.created, "2026-10-03T12:00:00Z");
    assert_eq!(log.metadata.last_updated, "2026-10-05T12:00:00Z");
    assert_eq!(log.evidence_log[0].control, "CC6.6");
    assert_eq!(log.evidence_log[0].timestamp, "2026-10-03T12:00:00Z");
  }

  #[test]
  fn statistics_group_and_range() {
    let mut log = EvidenceLog::empty(at(1));
    log.append(new("CC6.6", "api"), at(9)).unwrap();
    log.append(new("CC6.6", "web"), at(4)).unwrap();
    log.append(new("CC7.2", "api"), at(7)).unwrap();
    let stats = log.statistics();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_control["CC6.6"], 2);
    assert_eq!(stats.by_repo["api"], 2);
    assert_eq!(
      stats.date_range,
      Some(("2026-10-04".to_string(), "2026-10-09".to_string()))
    );
  }

  #[test]
  fn details_and_unknown_keys_are_kept() {
    let log: EvidenceLog = serde_yaml::from_str(
      r#"
metadata:
  created: "2026-01-01T00:00:00Z"
evidence_log:
  - timestamp: "2026-01-02T00:00:00Z"
    control_id: CC7.2
    event: CI failure remediated
    details: {run: 88}
    risk_level: low
"#,
    )
    .unwrap();
    let e = &log.evidence_log[0];
    assert_eq!(e.control, "CC7.2");
    assert!(e.details.is_some());
    assert!(e.extra.contains_key("risk_level"));
  }

  #[test]
  fn report_lists_controls() {
    let mut log = EvidenceLog::empty(at(1));
    log.append(new("CC6.6", "api"), at(2)).unwrap();
    let report = log.render_report(at(3));
    assert!(report.contains("| CC6.6 | Change management | 1 |"));
    assert!(report.contains("**Total Evidence Entries:** 1"));
  }
}
