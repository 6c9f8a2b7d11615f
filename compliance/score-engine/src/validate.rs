//! Completeness checks over the scoring sources.

use compliance_registers::{ControlMapping, Issue, Paths, RiskRegister};

use crate::collect::collect;
use crate::config::ScoreConfig;
use crate::error::ScoreError;

/// Every finding a `--validate` run reports. Errors fail the run, warnings do not.
pub fn validate(paths: &Paths, config: &ScoreConfig) -> Vec<Issue> {
  let mut issues = Vec::new();

  if let Err(e) = config.validate_weights() {
    issues.push(error_issue("COMPLIANCE_SCORE.yaml", &e));
  }

  for (name, path) in [
    ("SOC2_MAPPING.yaml", paths.soc2_mapping()),
    ("ISO27001_MAPPING.yaml", paths.iso27001_mapping()),
  ] {
    match ControlMapping::load_optional(&path) {
      Ok(Some(mapping)) => issues.extend(mapping.completeness_issues(name)),
      Ok(None) => issues.push(Issue::error(name, "mapping file not found")),
      Err(e) => issues.push(Issue::error(name, e.to_string())),
    }
  }

  match RiskRegister::load_optional(&paths.risk_register()) {
    Ok(Some(register)) => issues.extend(register.validate()),
    Ok(None) => {}
    Err(e) => issues.push(Issue::error("ISO_RISK_REGISTER.yaml", e.to_string())),
  }

  match collect(paths, config) {
    Ok(inputs) => {
      for cw in &config.categories {
        if !inputs.contains_key(&cw.id) && !config.overrides.contains_key(&cw.id) {
          issues.push(Issue::error(cw.id.as_str(), "no data source found for category"));
        }
      }
    }
    Err(e) => issues.push(error_issue("sources", &e)),
  }

  tracing::debug!(count = issues.len(), "validation finished");
  issues
}

fn error_issue(subject: &str, e: &ScoreError) -> Issue {
  match e {
    ScoreError::Validation { field, reason } => Issue::error(field.as_str(), reason.as_str()),
    other => Issue::error(subject, other.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use compliance_registers::issue::has_errors;
  use std::fs;

  #[test]
  fn missing_mappings_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let issues = validate(&Paths::new(dir.path()), &ScoreConfig::default());
    assert!(has_errors(&issues));
    assert!(issues.iter().any(|i| i.subject == "SOC2_MAPPING.yaml"));
    assert!(issues.iter().any(|i| i.subject == "risk_management"));
  }

  #[test]
  fn bad_weights_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ScoreConfig::default();
    config.categories[0].weight = 30.0;
    let issues = validate(&Paths::new(dir.path()), &config);
    assert!(issues.iter().any(|i| i.subject == "weights"));
  }

  #[test]
  fn duplicate_control_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    fs::create_dir_all(&paths.compliance_dir).unwrap();
    fs::write(
      paths.soc2_mapping(),
      "controls:\n  - control_id: CC1.1\n    description: a\n    status: Not Implemented\n  - control_id: CC1.1\n    description: b\n    status: Not Implemented\n",
    )
    .unwrap();
    let issues = validate(&paths, &ScoreConfig::default());
    assert!(issues
      .iter()
      .any(|i| i.is_error() && i.message.contains("duplicate")));
  }
}
