//! ISO 27001 risk register: validation, review tracking, explicit status updates.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{RegisterError, Result};
use crate::issue::Issue;
use crate::yaml;

/// Days after the last review at which a risk is overdue.
pub const REVIEW_OVERDUE_DAYS: i64 = 90;
/// Days after the last review at which a "due soon" alert starts.
pub const REVIEW_WARNING_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
  High,
  Medium,
  Low,
}

impl RiskLevel {
  pub const ALL: [RiskLevel; 3] = [Self::High, Self::Medium, Self::Low];

  pub fn label(self) -> &'static str {
    match self {
      Self::High => "High",
      Self::Medium => "Medium",
      Self::Low => "Low",
    }
  }
}

impl FromStr for RiskLevel {
  type Err = RegisterError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "high" => Ok(Self::High),
      "medium" => Ok(Self::Medium),
      "low" => Ok(Self::Low),
      _ => Err(RegisterError::validation("risk_level", "expected Low|Medium|High")),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskStatus {
  Mitigated,
  Accepted,
  Open,
  Transferred,
}

impl RiskStatus {
  pub const ALL: [RiskStatus; 4] = [Self::Mitigated, Self::Accepted, Self::Open, Self::Transferred];

  pub fn label(self) -> &'static str {
    match self {
      Self::Mitigated => "Mitigated",
      Self::Accepted => "Accepted",
      Self::Open => "Open",
      Self::Transferred => "Transferred",
    }
  }

  /// Counts as treated for scoring purposes.
  pub fn is_treated(self) -> bool {
    matches!(self, Self::Mitigated | Self::Accepted)
  }
}

impl FromStr for RiskStatus {
  type Err = RegisterError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "mitigated" => Ok(Self::Mitigated),
      "accepted" => Ok(Self::Accepted),
      "open" => Ok(Self::Open),
      "transferred" => Ok(Self::Transferred),
      _ => Err(RegisterError::validation(
        "status",
        "expected Mitigated|Accepted|Open|Transferred",
      )),
    }
  }
}

impl fmt::Display for RiskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// One risk. Enumerated fields stay raw so validation can report bad values;
/// keys this type does not know about are carried through `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskEntry {
  #[serde(alias = "risk_id", default)]
  pub id: String,
  #[serde(default)]
  pub title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub asset: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub threat: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub likelihood: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub impact: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub risk_score: Option<Value>,
  #[serde(default)]
  pub risk_level: String,
  #[serde(default)]
  pub status: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub controls: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub treatment: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub residual_risk: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub owner: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub review_date: Option<String>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

impl RiskEntry {
  pub fn level(&self) -> Option<RiskLevel> {
    self.risk_level.parse().ok()
  }

  pub fn status(&self) -> Option<RiskStatus> {
    self.status.parse().ok()
  }

  fn subject(&self) -> &str {
    if self.id.is_empty() {
      "UNKNOWN"
    } else {
      &self.id
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
  #[serde(default)]
  pub total_risks: usize,
  #[serde(default)]
  pub by_level: BTreeMap<String, usize>,
  #[serde(default)]
  pub by_status: BTreeMap<String, usize>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_updated: Option<String>,
}

impl RiskSummary {
  pub fn status_count(&self, status: RiskStatus) -> usize {
    self
      .by_status
      .iter()
      .filter(|(k, _)| k.parse::<RiskStatus>().ok() == Some(status))
      .map(|(_, v)| *v)
      .sum()
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskRegister {
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub metadata: BTreeMap<String, Value>,
  #[serde(default)]
  pub risks: Vec<RiskEntry>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary: Option<RiskSummary>,
  #[serde(flatten)]
  pub extra: BTreeMap<String, Value>,
}

/// Treated vs total risks, the input to the risk-management score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreatmentCounts {
  pub total: u32,
  pub treated: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAlert {
  Overdue { risk_id: String, days: i64 },
  DueSoon { risk_id: String, days: i64 },
  MissingDate { risk_id: String },
  InvalidDate { risk_id: String, raw: String },
}

impl fmt::Display for ReviewAlert {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Overdue { risk_id, days } => write!(f, "{}: Review overdue by {} days", risk_id, days),
      Self::DueSoon { risk_id, days } => write!(f, "{}: Review due in {} days", risk_id, days),
      Self::MissingDate { risk_id } => write!(f, "{}: No review_date set", risk_id),
      Self::InvalidDate { risk_id, raw } => {
        write!(f, "{}: Invalid review_date format '{}'", risk_id, raw)
      }
    }
  }
}

/// Result of an explicit status update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
  pub risk_id: String,
  pub from: String,
  pub to: RiskStatus,
  pub review_date: NaiveDate,
}

impl fmt::Display for StatusTransition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {} -> {}", self.risk_id, self.from, self.to)
  }
}

impl RiskRegister {
  pub fn load(path: &Path) -> Result<Self> {
    yaml::read(path)
  }

  pub fn load_optional(path: &Path) -> Result<Option<Self>> {
    yaml::read_optional(path)
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    yaml::write(path, self)?;
    tracing::info!(path = %path.display(), risks = self.risks.len(), "saved risk register");
    Ok(())
  }

  pub fn find(&self, id: &str) -> Option<&RiskEntry> {
    self.risks.iter().find(|r| r.id == id)
  }

  /// Treated/total counts from the risk list, or the stored summary when the list is empty.
  pub fn treatment_counts(&self) -> TreatmentCounts {
    if self.risks.is_empty() {
      if let Some(s) = &self.summary {
        let treated = s.status_count(RiskStatus::Mitigated) + s.status_count(RiskStatus::Accepted);
        return TreatmentCounts {
          total: s.total_risks as u32,
          treated: treated.min(s.total_risks) as u32,
        };
      }
    }
    let treated = self
      .risks
      .iter()
      .filter(|r| r.status().is_some_and(RiskStatus::is_treated))
      .count();
    TreatmentCounts {
      total: self.risks.len() as u32,
      treated: treated as u32,
    }
  }

  /// Risks that are neither mitigated nor accepted.
  pub fn untreated(&self) -> Vec<&RiskEntry> {
    self
      .risks
      .iter()
      .filter(|r| !r.status().is_some_and(RiskStatus::is_treated))
      .collect()
  }

  pub fn validate(&self) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for risk in &self.risks {
      let subject = risk.subject();

      if !risk.id.is_empty() && !seen.insert(risk.id.as_str()) {
        issues.push(Issue::error(subject, "duplicate risk id"));
      }

      let present = [
        ("id", !risk.id.trim().is_empty()),
        ("title", !risk.title.trim().is_empty()),
        ("asset", risk.asset.as_deref().is_some_and(|s| !s.trim().is_empty())),
        ("threat", risk.threat.as_deref().is_some_and(|s| !s.trim().is_empty())),
        ("likelihood", risk.likelihood.as_ref().is_some_and(value_present)),
        ("impact", risk.impact.as_ref().is_some_and(value_present)),
        ("risk_level", !risk.risk_level.trim().is_empty()),
        ("status", !risk.status.trim().is_empty()),
      ];
      for (field, ok) in present {
        if !ok {
          issues.push(Issue::error(subject, format!("Missing required field '{}'", field)));
        }
      }

      if risk.level().is_none() {
        issues.push(Issue::error(
          subject,
          format!("Invalid risk_level '{}'", risk.risk_level),
        ));
      }
      let status = risk.status();
      if status.is_none() {
        issues.push(Issue::error(subject, format!("Invalid status '{}'", risk.status)));
      }
      if status != Some(RiskStatus::Accepted) && risk.controls.is_empty() {
        issues.push(Issue::error(subject, "Non-accepted risk has no controls defined"));
      }
      if risk.level() == Some(RiskLevel::High) && status == Some(RiskStatus::Accepted) {
        issues.push(Issue::warning(
          subject,
          "High risk is ACCEPTED - requires management review",
        ));
      }
    }

    issues
  }

  pub fn check_reviews(&self, today: NaiveDate) -> Vec<ReviewAlert> {
    let mut alerts = Vec::new();
    for risk in &self.risks {
      let risk_id = risk.subject().to_string();
      let raw = match risk.review_date.as_deref().map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => {
          alerts.push(ReviewAlert::MissingDate { risk_id });
          continue;
        }
      };
      let reviewed = match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
          alerts.push(ReviewAlert::InvalidDate {
            risk_id,
            raw: raw.to_string(),
          });
          continue;
        }
      };
      let days_since = (today - reviewed).num_days();
      if days_since > REVIEW_OVERDUE_DAYS {
        alerts.push(ReviewAlert::Overdue {
          risk_id,
          days: days_since - REVIEW_OVERDUE_DAYS,
        });
      } else if days_since > REVIEW_WARNING_DAYS {
        alerts.push(ReviewAlert::DueSoon {
          risk_id,
          days: REVIEW_OVERDUE_DAYS - days_since,
        });
      }
    }
    alerts
  }

  /// Recount risks by level and status. Unknown values are not counted.
  pub fn summary(&self) -> RiskSummary {
    let mut by_level: BTreeMap<String, usize> =
      RiskLevel::ALL.iter().map(|l| (l.label().to_string(), 0)).collect();
    let mut by_status: BTreeMap<String, usize> =
      RiskStatus::ALL.iter().map(|s| (s.label().to_string(), 0)).collect();

    for risk in &self.risks {
      if let Some(level) = risk.level() {
        *by_level.entry(level.label().to_string()).or_insert(0) += 1;
      }
      if let Some(status) = risk.status() {
        *by_status.entry(status.label().to_string()).or_insert(0) += 1;
      }
    }

    RiskSummary {
      total_risks: self.risks.len(),
      by_level,
      by_status,
      last_updated: None,
    }
  }

  /// Move one risk to `status`, stamp its review date and refresh the summary.
  pub fn update_status(
    &mut self,
    risk_id: &str,
    status: RiskStatus,
    today: NaiveDate,
  ) -> Result<StatusTransition> {
    let risk = self
      .risks
      .iter_mut()
      .find(|r| r.id == risk_id)
      .ok_or_else(|| RegisterError::UnknownRisk(risk_id.to_string()))?;

    let from = std::mem::replace(&mut risk.status, status.label().to_string());
    risk.review_date = Some(today.format("%Y-%m-%d").to_string());

    let mut summary = self.summary();
    summary.last_updated = Some(today.format("%Y-%m-%d").to_string());
    self.summary = Some(summary);

    let transition = StatusTransition {
      risk_id: risk_id.to_string(),
      from,
      to: status,
      review_date: today,
    };
    tracing::info!(%transition, "risk status updated");
    Ok(transition)
  }

  /// Markdown report: summary, risks ordered High first, validation issues and review alerts.
  pub fn render_report(&self, today: NaiveDate) -> String {
    let summary = self.summary();
    let meta = |key: &str| {
      self
        .metadata
        .get(key)
        .map(display_value)
        .unwrap_or_else(|| "N/A".to_string())
    };
    let count = |map: &BTreeMap<String, usize>, key: &str| map.get(key).copied().unwrap_or(0);

    let mut lines = vec![
      "# ISO 27001 Risk Register Report".to_string(),
      String::new(),
      format!("**Generated:** {}", today.format("%Y-%m-%d")),
      format!(
        "**Framework:** {}",
        self
          .metadata
          .get("framework")
          .map(display_value)
          .unwrap_or_else(|| "ISO 27001".to_string())
      ),
      format!("**Last Review:** {}", meta("last_review")),
      format!("**Next Review:** {}", meta("next_review")),
      String::new(),
      "---".to_string(),
      String::new(),
      "## Executive Summary".to_string(),
      String::new(),
      format!("- **Total Risks:** {}", summary.total_risks),
      format!("- **High Risks:** {}", count(&summary.by_level, "High")),
      format!("- **Medium Risks:** {}", count(&summary.by_level, "Medium")),
      format!("- **Low Risks:** {}", count(&summary.by_level, "Low")),
      String::new(),
      "### Risk Treatment Status".to_string(),
      String::new(),
    ];
    for status in RiskStatus::ALL {
      lines.push(format!(
        "- **{}:** {}",
        status.label(),
        count(&summary.by_status, status.label())
      ));
    }
    lines.extend([
      String::new(),
      "---".to_string(),
      String::new(),
      "## Risk Register".to_string(),
      String::new(),
    ]);

    let mut sorted: Vec<&RiskEntry> = self.risks.iter().collect();
    sorted.sort_by_key(|r| r.level().map(|l| l as u8).unwrap_or(u8::MAX));

    for risk in sorted {
      let marker = match risk.level() {
        Some(RiskLevel::High) => "!!!",
        Some(RiskLevel::Medium) => "!!",
        Some(RiskLevel::Low) => "!",
        None => "?",
      };
      let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
      let val = |v: &Option<Value>| v.as_ref().map(display_value).unwrap_or_else(|| "N/A".to_string());
      let title = if risk.title.is_empty() { "Untitled" } else { risk.title.as_str() };

      lines.extend([
        format!("### {} {} - {}", marker, risk.subject(), title),
        String::new(),
        format!("**Category:** {}", opt(&risk.category)),
        format!("**Asset:** {}", opt(&risk.asset)),
        String::new(),
        format!("**Threat:** {}", opt(&risk.threat)),
        String::new(),
        "| Likelihood | Impact | Risk Score | Risk Level |".to_string(),
        "|------------|--------|------------|------------|".to_string(),
        format!(
          "| {} | {} | {} | **{}** |",
          val(&risk.likelihood),
          val(&risk.impact),
          val(&risk.risk_score),
          risk.risk_level
        ),
        String::new(),
        "**Controls:**".to_string(),
      ]);
      lines.extend(risk.controls.iter().map(|c| format!("- {}", c)));
      lines.extend([
        String::new(),
        format!("**Treatment:** {}", opt(&risk.treatment)),
        format!("**Status:** {}", risk.status),
        format!("**Residual Risk:** {}", opt(&risk.residual_risk)),
        format!("**Owner:** {}", opt(&risk.owner)),
        format!("**Review Date:** {}", opt(&risk.review_date)),
        String::new(),
        "---".to_string(),
        String::new(),
      ]);
    }

    let issues = self.validate();
    if !issues.is_empty() {
      lines.push("## Validation Issues".to_string());
      lines.push(String::new());
      lines.extend(issues.iter().map(|i| format!("- {}", i)));
      lines.push(String::new());
    }

    let alerts = self.check_reviews(today);
    if !alerts.is_empty() {
      lines.push("## Review Alerts".to_string());
      lines.push(String::new());
      lines.extend(alerts.iter().map(|a| format!("- {}", a)));
      lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push(String::new());
    lines.push("*Risk reviews occur quarterly or after significant changes.*".to_string());
    lines.join("\n")
  }
}

fn value_present(v: &Value) -> bool {
  match v {
    Value::Null => false,
    Value::String(s) => !s.trim().is_empty(),
    _ => true,
  }
}

/// Render a scalar YAML value the way a human wrote it.
pub fn display_value(v: &Value) -> String {
  match v {
    Value::Null => "N/A".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.clone(),
    other => serde_yaml::to_string(other)
      .map(|s| s.trim_end().to_string())
      .unwrap_or_default(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const REGISTER: &str = r#"
metadata:
  framework: ISO 27001:2022
  last_review: "2026-07-01"
risks:
  - id: R-001
    title: Credential leak
    asset: CI secrets
    threat: Token exfiltration
    likelihood: Medium
    impact: High
    risk_score: 12
    risk_level: High
    status: Open
    controls: [secret scanning]
    review_date: "2026-09-01"
    owner: platform
    ticket: SEC-41
  - id: R-002
    title: Vendor outage
    asset: Hosting
    threat: Provider downtime
    likelihood: Low
    impact: Medium
    risk_level: Medium
    status: Accepted
    review_date: "2026-05-01"
  - id: R-003
    title: Stale dependency
    asset: Build
    threat: Known CVE
    likelihood: 2
    impact: 2
    risk_level: Low
    status: Mitigated
    controls: [dependabot]
"#;

  fn register() -> RiskRegister {
    serde_yaml::from_str(REGISTER).unwrap()
  }

  fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn valid_register_has_no_errors() {
    let issues = register().validate();
    assert!(issues.iter().all(|i| !i.is_error()), "{:?}", issues);
  }

  #[test]
  fn accepted_high_risk_is_warning() {
    let mut reg = register();
    reg.risks[0].status = "Accepted".into();
    let issues = reg.validate();
    assert_eq!(issues.len(), 1);
    assert!(!issues[0].is_error());
    assert!(issues[0].message.contains("management review"));
  }

  #[test]
  fn invalid_values_and_missing_controls_are_errors() {
    let mut reg = register();
    reg.risks[2].status = "Closed".into();
    reg.risks[2].controls.clear();
    reg.risks[2].risk_level = "Severe".into();
    let text: Vec<String> = reg.validate().iter().map(|i| i.to_string()).collect();
    assert!(text.iter().any(|t| t.contains("Invalid status 'Closed'")));
    assert!(text.iter().any(|t| t.contains("Invalid risk_level 'Severe'")));
    assert!(text.iter().any(|t| t.contains("no controls defined")));
  }

  #[test]
  fn review_alerts() {
    let alerts = register().check_reviews(day(2026, 10, 19));
    // R-001 reviewed 48 days ago: fine. R-002 171 days ago: overdue by 81. R-003: no date.
    assert_eq!(
      alerts,
      vec![
        ReviewAlert::Overdue {
          risk_id: "R-002".into(),
          days: 81
        },
        ReviewAlert::MissingDate {
          risk_id: "R-003".into()
        },
      ]
    );
  }

  #[test]
  fn due_soon_window() {
    let mut reg = register();
    reg.risks.truncate(1);
    let alerts = reg.check_reviews(day(2026, 11, 15));
    // 75 days since review: due in 15.
    assert_eq!(
      alerts,
      vec![ReviewAlert::DueSoon {
        risk_id: "R-001".into(),
        days: 15
      }]
    );
  }

  #[test]
  fn summary_and_treatment_counts() {
    let reg = register();
    let s = reg.summary();
    assert_eq!(s.total_risks, 3);
    assert_eq!(s.by_level["High"], 1);
    assert_eq!(s.by_status["Open"], 1);
    assert_eq!(s.by_status["Transferred"], 0);
    assert_eq!(
      reg.treatment_counts(),
      TreatmentCounts {
        total: 3,
        treated: 2
      }
    );
    assert_eq!(reg.untreated().len(), 1);
  }

  #[test]
  fn treatment_counts_fall_back_to_summary() {
    let reg: RiskRegister = serde_yaml::from_str(
      "summary:\n  total_risks: 4\n  by_status:\n    mitigated: 2\n    Accepted: 1\n",
    )
    .unwrap();
    assert_eq!(
      reg.treatment_counts(),
      TreatmentCounts {
        total: 4,
        treated: 3
      }
    );
  }

  #[test]
  fn update_status_stamps_review_and_summary() {
    let mut reg = register();
    let today = day(2026, 10, 19);
    let t = reg.update_status("R-001", RiskStatus::Mitigated, today).unwrap();
    assert_eq!(t.from, "Open");
    assert_eq!(t.to, RiskStatus::Mitigated);
    assert_eq!(t.to_string(), "R-001: Open -> Mitigated");

    let risk = reg.find("R-001").unwrap();
    assert_eq!(risk.status, "Mitigated");
    assert_eq!(risk.review_date.as_deref(), Some("2026-10-19"));
    let summary = reg.summary.as_ref().unwrap();
    assert_eq!(summary.by_status["Mitigated"], 2);
    assert_eq!(summary.last_updated.as_deref(), Some("2026-10-19"));
  }

  #[test]
  fn update_unknown_risk_fails() {
    let mut reg = register();
    let err = reg
      .update_status("R-404", RiskStatus::Open, day(2026, 1, 1))
      .unwrap_err();
    assert!(matches!(err, RegisterError::UnknownRisk(ref id) if id == "R-404"));
  }

  #[test]
  fn unknown_keys_survive_round_trip() {
    let reg = register();
    let out = serde_yaml::to_string(&reg).unwrap();
    assert!(out.contains("ticket: SEC-41"));
    assert!(out.contains("risk_score: 12"));
  }

  #[test]
  fn report_orders_high_first_and_lists_alerts() {
    let report = register().render_report(day(2026, 10, 19));
    let high = report.find("R-001").unwrap();
    let low = report.find("### ! R-003").unwrap();
    assert!(high < low);
    assert!(report.contains("**Framework:** ISO 27001:2022"));
    assert!(report.contains("## Review Alerts"));
    assert!(report.contains("R-002: Review overdue by 81 days"));
  }

  #[test]
  fn status_parse_is_case_insensitive() {
    assert_eq!("mitigated".parse::<RiskStatus>().unwrap(), RiskStatus::Mitigated);
    assert!("closed".parse::<RiskStatus>().is_err());
  }
}
