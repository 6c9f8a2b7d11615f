//! Score configuration: category weights, thresholds and collector settings.
//!
//! Built-in defaults can be overridden by `COMPLIANCE_SCORE.yaml`:
//!
//! ```yaml
//! components:
//!   soc2_controls: { weight: 25 }
//!   evidence_collection: { weight: 15, target_entries: 200 }
//!   cicd_compliance:
//!     weight: 10
//!     checks: [{ name: CODEOWNERS, file: .github/CODEOWNERS }]
//!   questionnaire_readiness: { weight: 10, override: 80 }
//! overall_thresholds:
//!   excellent: { min_score: 90, color: "#22c55e" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use compliance_registers::yaml;

use crate::error::ScoreError;

pub const SOC2_CONTROLS: &str = "soc2_controls";
pub const ISO27001_CONTROLS: &str = "iso27001_controls";
pub const RISK_MANAGEMENT: &str = "risk_management";
pub const EVIDENCE_COLLECTION: &str = "evidence_collection";
pub const CICD_COMPLIANCE: &str = "cicd_compliance";
pub const QUESTIONNAIRE_READINESS: &str = "questionnaire_readiness";

/// Weights must add up to this, within `WEIGHT_TOLERANCE`.
pub const WEIGHT_TOTAL: f64 = 100.0;
const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Colour for a configured band that is not one of the built-in ones.
const NEW_BAND_COLOR: &str = "#6b7280";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryWeight {
  pub id: String,
  pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Threshold {
  pub label: String,
  pub min_score: f64,
  pub color: String,
}

/// A workflow or policy file whose presence counts toward CI/CD compliance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CicdCheck {
  pub name: String,
  pub file: String,
  #[serde(default = "default_true")]
  pub required: bool,
}

fn default_true() -> bool {
  true
}

/// Tunable scoring configuration.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
  /// Scored categories, in report order.
  pub categories: Vec<CategoryWeight>,
  /// Score bands, highest `min_score` first.
  pub thresholds: Vec<Threshold>,
  /// Evidence log entries that count as 100% evidence collection.
  pub evidence_target: u32,
  pub cicd_checks: Vec<CicdCheck>,
  /// Fixed percentages that replace collected data for a category.
  pub overrides: BTreeMap<String, f64>,
}

impl Default for ScoreConfig {
  fn default() -> Self {
    let weight = |id: &str, weight: f64| CategoryWeight {
      id: id.to_string(),
      weight,
    };
    let band = |label: &str, min_score: f64, color: &str| Threshold {
      label: label.to_string(),
      min_score,
      color: color.to_string(),
    };
    let check = |name: &str, file: &str| CicdCheck {
      name: name.to_string(),
      file: file.to_string(),
      required: true,
    };
    Self {
      categories: vec![
        weight(SOC2_CONTROLS, 25.0),
        weight(ISO27001_CONTROLS, 20.0),
        weight(RISK_MANAGEMENT, 20.0),
        weight(EVIDENCE_COLLECTION, 15.0),
        weight(CICD_COMPLIANCE, 10.0),
        weight(QUESTIONNAIRE_READINESS, 10.0),
      ],
      thresholds: vec![
        band("Excellent", 90.0, "#22c55e"),
        band("Good", 75.0, "#3b82f6"),
        band("Acceptable", 60.0, "#f59e0b"),
        band("Needs Attention", 40.0, "#f97316"),
        band("Critical", 0.0, "#ef4444"),
      ],
      evidence_target: 200,
      cicd_checks: vec![
        check("CODEOWNERS", ".github/CODEOWNERS"),
        check("CI workflow", ".github/workflows/ci.yml"),
        check("Security workflow", ".github/workflows/security.yml"),
        check("AI review workflow", ".github/workflows/ai-review.yml"),
        check("Auto-merge policy", ".ai/AUTO_MERGE_POLICY.yaml"),
      ],
      overrides: BTreeMap::new(),
    }
  }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
  #[serde(default)]
  components: BTreeMap<String, RawComponent>,
  #[serde(default)]
  overall_thresholds: BTreeMap<String, RawThreshold>,
}

/// Band overlay; absent fields keep the built-in band's values.
#[derive(Debug, Default, Deserialize)]
struct RawThreshold {
  #[serde(default)]
  label: Option<String>,
  #[serde(default)]
  min_score: Option<f64>,
  #[serde(default)]
  color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawComponent {
  #[serde(default)]
  weight: Option<f64>,
  #[serde(default)]
  target_entries: Option<u32>,
  #[serde(default)]
  checks: Option<Vec<CicdCheck>>,
  #[serde(default, rename = "override")]
  override_pct: Option<f64>,
}

fn threshold_label(key: &str) -> String {
  key
    .split('_')
    .filter(|w| !w.is_empty())
    .map(|w| {
      let mut chars = w.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

impl ScoreConfig {
  /// Defaults, overlaid with the YAML file at `path` when it exists.
  pub fn load(path: &Path) -> Result<Self, ScoreError> {
    let raw: Option<Option<RawConfig>> = yaml::read_optional(path)?;
    let mut config = Self::default();
    match raw.flatten() {
      Some(raw) => {
        tracing::debug!(path = %path.display(), "applying score config");
        config.apply(raw);
      }
      None => tracing::debug!(path = %path.display(), "no score config, using defaults"),
    }
    Ok(config)
  }

  fn apply(&mut self, raw: RawConfig) {
    for (id, component) in raw.components {
      if let Some(weight) = component.weight {
        match self.categories.iter_mut().find(|c| c.id == id) {
          Some(existing) => existing.weight = weight,
          None => self.categories.push(CategoryWeight {
            id: id.clone(),
            weight,
          }),
        }
      }
      if let Some(target) = component.target_entries {
        if id == EVIDENCE_COLLECTION {
          self.evidence_target = target;
        }
      }
      if let Some(checks) = component.checks.filter(|c| !c.is_empty()) {
        if id == CICD_COMPLIANCE {
          self.cicd_checks = checks;
        }
      }
      if let Some(pct) = component.override_pct {
        self.overrides.insert(id, pct);
      }
    }

    if !raw.overall_thresholds.is_empty() {
      for (key, band) in raw.overall_thresholds {
        let label = band.label.unwrap_or_else(|| threshold_label(&key));
        match self.thresholds.iter_mut().find(|t| t.label == label) {
          Some(existing) => {
            if let Some(min_score) = band.min_score {
              existing.min_score = min_score;
            }
            if let Some(color) = band.color {
              existing.color = color;
            }
          }
          None => match band.min_score {
            Some(min_score) => self.thresholds.push(Threshold {
              label,
              min_score,
              color: band.color.unwrap_or_else(|| NEW_BAND_COLOR.to_string()),
            }),
            None => tracing::warn!(band = %key, "new threshold band has no min_score, ignored"),
          },
        }
      }
      self
        .thresholds
        .sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
    }
  }

  pub fn weight_total(&self) -> f64 {
    self.categories.iter().map(|c| c.weight).sum()
  }

  /// Weights must be non-negative, unique per category and sum to 100.
  pub fn validate_weights(&self) -> Result<(), ScoreError> {
    if self.categories.is_empty() {
      return Err(ScoreError::validation("weights", "no categories configured"));
    }
    for (idx, c) in self.categories.iter().enumerate() {
      if !c.weight.is_finite() || c.weight < 0.0 {
        return Err(ScoreError::validation(
          &c.id,
          &format!("weight must be a non-negative number, got {}", c.weight),
        ));
      }
      if self.categories[..idx].iter().any(|p| p.id == c.id) {
        return Err(ScoreError::validation(&c.id, "category configured twice"));
      }
    }
    let total = self.weight_total();
    if (total - WEIGHT_TOTAL).abs() > WEIGHT_TOLERANCE {
      return Err(ScoreError::validation(
        "weights",
        &format!("weights sum to {}, expected {}", total, WEIGHT_TOTAL),
      ));
    }
    Ok(())
  }

  /// Label and colour of the band `score` falls into.
  pub fn band(&self, score: f64) -> (&str, &str) {
    self
      .thresholds
      .iter()
      .find(|t| score >= t.min_score)
      .or_else(|| self.thresholds.last())
      .map(|t| (t.label.as_str(), t.color.as_str()))
      .unwrap_or(("Critical", "#ef4444"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_weights_sum_to_100() {
    let config = ScoreConfig::default();
    assert!(config.validate_weights().is_ok());
    assert_eq!(config.categories.len(), 6);
  }

  #[test]
  fn bands_follow_thresholds() {
    let config = ScoreConfig::default();
    assert_eq!(config.band(95.0), ("Excellent", "#22c55e"));
    assert_eq!(config.band(75.0).0, "Good");
    assert_eq!(config.band(59.9).0, "Needs Attention");
    assert_eq!(config.band(0.0).0, "Critical");
  }

  #[test]
  fn bad_weight_sum_is_rejected() {
    let mut config = ScoreConfig::default();
    config.categories[0].weight = 30.0;
    let err = config.validate_weights().unwrap_err();
    assert!(err.to_string().contains("weights sum to 105"));
  }

  #[test]
  fn negative_weight_names_category() {
    let mut config = ScoreConfig::default();
    config.categories[0].weight = -5.0;
    config.categories[1].weight = 50.0;
    let err = config.validate_weights().unwrap_err();
    assert!(err.to_string().contains(SOC2_CONTROLS));
  }

  #[test]
  fn yaml_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("COMPLIANCE_SCORE.yaml");
    std::fs::write(
      &path,
      r##"
components:
  soc2_controls: { weight: 30 }
  cicd_compliance: { weight: 5, checks: [{ name: CI, file: ci.yml }] }
  evidence_collection: { target_entries: 50 }
  questionnaire_readiness: { override: 80 }
overall_thresholds:
  needs_attention: { min_score: 45, color: "#000000" }
"##,
    )
    .unwrap();

    let config = ScoreConfig::load(&path).unwrap();
    assert_eq!(config.categories[0].weight, 30.0);
    assert_eq!(config.evidence_target, 50);
    assert_eq!(config.cicd_checks.len(), 1);
    assert!(config.cicd_checks[0].required);
    assert_eq!(config.overrides[QUESTIONNAIRE_READINESS], 80.0);
    assert_eq!(config.band(44.0).0, "Critical");
    assert_eq!(config.band(45.0), ("Needs Attention", "#000000"));
    assert!(config.validate_weights().is_ok());
  }

  #[test]
  fn partial_threshold_keeps_builtin_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("COMPLIANCE_SCORE.yaml");
    std::fs::write(
      &path,
      r##"
overall_thresholds:
  excellent: { min_score: 85 }
  good: { color: "#123456" }
  platinum: { color: "#ffffff" }
  elite: { min_score: 98 }
"##,
    )
    .unwrap();

    let config = ScoreConfig::load(&path).unwrap();
    assert_eq!(config.band(86.0), ("Excellent", "#22c55e"));
    assert_eq!(config.band(80.0), ("Good", "#123456"));
    assert_eq!(config.band(99.0), ("Elite", NEW_BAND_COLOR));
    assert!(config.thresholds.iter().all(|t| t.label != "Platinum"));
  }

  #[test]
  fn missing_file_means_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = ScoreConfig::load(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config.evidence_target, 200);
  }
}
