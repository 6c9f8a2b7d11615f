//! Gather per-category inputs from the compliance sources.
//!
//! A source that does not exist yields no entry for its category, so scoring
//! fails naming that category instead of silently counting it as 0 or 100.

use compliance_registers::{questionnaire, ControlMapping, EvidenceLog, Paths, RiskRegister};

use crate::config::*;
use crate::error::ScoreError;
use crate::types::{CategoryData, Gap, Inputs};

fn mapping_data(category: &str, mapping: &ControlMapping) -> Option<CategoryData> {
  let counts = mapping.counts()?;
  let gaps = mapping
    .gaps()
    .into_iter()
    .map(|c| Gap::new(category, c.control_id.clone(), c.description.clone()))
    .collect();
  Some(CategoryData::counts(counts.total, counts.implemented).with_gaps(gaps))
}

fn risk_data(register: &RiskRegister) -> CategoryData {
  let counts = register.treatment_counts();
  let gaps = register
    .untreated()
    .into_iter()
    .map(|r| {
      Gap::new(
        RISK_MANAGEMENT,
        r.id.clone(),
        format!("{} ({})", r.title, if r.status.is_empty() { "no status" } else { r.status.as_str() }),
      )
    })
    .collect();
  CategoryData::counts(counts.total, counts.treated).with_gaps(gaps)
}

fn evidence_data(log: &EvidenceLog, target: u32) -> CategoryData {
  let entries = log.len() as u32;
  let mut data = CategoryData::counts(target, entries.min(target));
  if entries < target {
    data.gaps.push(Gap::new(
      EVIDENCE_COLLECTION,
      "evidence_log",
      format!("{} of {} target entries recorded", entries, target),
    ));
  }
  data
}

/// Optional checks count only when their file is present.
fn cicd_data(paths: &Paths, checks: &[CicdCheck]) -> CategoryData {
  let mut total = 0;
  let mut passed = 0;
  let mut gaps = Vec::new();
  for check in checks {
    if paths.in_repo(&check.file).is_file() {
      total += 1;
      passed += 1;
    } else if check.required {
      tracing::debug!(check = %check.name, file = %check.file, "ci check file missing");
      total += 1;
      gaps.push(Gap::new(
        CICD_COMPLIANCE,
        check.name.clone(),
        format!("{} not found", check.file),
      ));
    } else {
      tracing::debug!(check = %check.name, "optional ci check skipped");
    }
  }
  CategoryData::counts(total, passed).with_gaps(gaps)
}

fn questionnaire_data(questionnaires: &[questionnaire::Questionnaire]) -> CategoryData {
  let mut total = 0;
  let mut implemented = 0;
  let mut gaps = Vec::new();
  for q in questionnaires {
    total += q.total();
    implemented += q.implemented();
    for (idx, question) in q.questions.iter().enumerate() {
      if !question.is_implemented() {
        let id = match &question.id {
          Some(id) => format!("{}/{}", q.name, id),
          None => format!("{}#{}", q.name, idx + 1),
        };
        gaps.push(Gap::new(QUESTIONNAIRE_READINESS, id, question.question.clone()));
      }
    }
  }
  CategoryData::counts(total, implemented).with_gaps(gaps)
}

/// Read every source the built-in categories draw from.
pub fn collect(paths: &Paths, config: &ScoreConfig) -> Result<Inputs, ScoreError> {
  let mut inputs = Inputs::new();

  for (category, path) in [
    (SOC2_CONTROLS, paths.soc2_mapping()),
    (ISO27001_CONTROLS, paths.iso27001_mapping()),
  ] {
    match ControlMapping::load_optional(&path)? {
      Some(mapping) => match mapping_data(category, &mapping) {
        Some(data) => {
          inputs.insert(category.to_string(), data);
        }
        None => tracing::warn!(path = %path.display(), "mapping has no controls or summary"),
      },
      None => tracing::warn!(path = %path.display(), "mapping not found"),
    }
  }

  match RiskRegister::load_optional(&paths.risk_register())? {
    Some(register) => {
      inputs.insert(RISK_MANAGEMENT.to_string(), risk_data(&register));
    }
    None => tracing::warn!(path = %paths.risk_register().display(), "risk register not found"),
  }

  match EvidenceLog::load_optional(&paths.evidence_log())? {
    Some(log) => {
      inputs.insert(
        EVIDENCE_COLLECTION.to_string(),
        evidence_data(&log, config.evidence_target),
      );
    }
    None => tracing::warn!(path = %paths.evidence_log().display(), "evidence log not found"),
  }

  inputs.insert(
    CICD_COMPLIANCE.to_string(),
    cicd_data(paths, &config.cicd_checks),
  );

  match questionnaire::load_dir(&paths.questionnaires_dir())? {
    Some(list) => {
      inputs.insert(QUESTIONNAIRE_READINESS.to_string(), questionnaire_data(&list));
    }
    None => tracing::warn!(
      path = %paths.questionnaires_dir().display(),
      "questionnaire directory not found"
    ),
  }

  Ok(inputs)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::CategoryInput;

  #[test]
  fn evidence_capped_at_target() {
    let mut log = EvidenceLog::default();
    for _ in 0..5 {
      log.evidence_log.push(Default::default());
    }
    let data = evidence_data(&log, 3);
    assert_eq!(
      data.input,
      CategoryInput::Counts {
        total: 3,
        implemented: 3
      }
    );
    assert!(data.gaps.is_empty());

    let short = evidence_data(&log, 10);
    assert_eq!(short.gaps.len(), 1);
  }

  #[test]
  fn zero_target_means_no_data() {
    let data = evidence_data(&EvidenceLog::default(), 0);
    assert_eq!(
      data.input,
      CategoryInput::Counts {
        total: 0,
        implemented: 0
      }
    );
  }

  #[test]
  fn cicd_checks_resolve_against_repo_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".github")).unwrap();
    std::fs::write(dir.path().join(".github/CODEOWNERS"), "* @team").unwrap();
    let paths = Paths::new(dir.path());
    let data = cicd_data(&paths, &ScoreConfig::default().cicd_checks);
    assert_eq!(
      data.input,
      CategoryInput::Counts {
        total: 5,
        implemented: 1
      }
    );
    assert_eq!(data.gaps.len(), 4);
  }

  #[test]
  fn missing_optional_check_is_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let checks = vec![
      CicdCheck {
        name: "CI workflow".into(),
        file: ".github/workflows/ci.yml".into(),
        required: true,
      },
      CicdCheck {
        name: "Nightly".into(),
        file: ".github/workflows/nightly.yml".into(),
        required: false,
      },
    ];
    let data = cicd_data(&paths, &checks);
    assert_eq!(
      data.input,
      CategoryInput::Counts {
        total: 1,
        implemented: 0
      }
    );
  }

  #[test]
  fn empty_compliance_dir_only_has_cicd() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let inputs = collect(&paths, &ScoreConfig::default()).unwrap();
    assert_eq!(inputs.keys().collect::<Vec<_>>(), vec![CICD_COMPLIANCE]);
  }
}
