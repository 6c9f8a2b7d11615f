//! Integration tests for the registers against an on-disk compliance directory.

use std::fs;

use chrono::NaiveDate;
use compliance_registers::{ControlMapping, EvidenceLog, Paths, RiskRegister, RiskStatus};

const RISKS: &str = r#"
metadata:
  framework: ISO 27001
risks:
  - id: R-001
    title: Credential leak
    asset: CI secrets
    threat: Token exfiltration
    likelihood: Medium
    impact: High
    risk_level: High
    status: Open
    controls: [secret scanning]
    review_date: "2026-09-01"
    notes: keep me
"#;

fn fixture() -> (tempfile::TempDir, Paths) {
  let dir = tempfile::tempdir().unwrap();
  let paths = Paths::new(dir.path());
  fs::create_dir_all(&paths.compliance_dir).unwrap();
  fs::write(paths.risk_register(), RISKS).unwrap();
  fs::write(
    paths.soc2_mapping(),
    "controls:\n  - control_id: CC6.1\n    description: Access\n    status: Implemented\n    evidence: .github/CODEOWNERS\n",
  )
  .unwrap();
  (dir, paths)
}

#[test]
fn status_update_persists_and_preserves_unknown_keys() {
  let (_dir, paths) = fixture();
  let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

  let mut register = RiskRegister::load(&paths.risk_register()).unwrap();
  register
    .update_status("R-001", RiskStatus::Mitigated, today)
    .unwrap();
  register.save(&paths.risk_register()).unwrap();

  let reloaded = RiskRegister::load(&paths.risk_register()).unwrap();
  let risk = reloaded.find("R-001").unwrap();
  assert_eq!(risk.status(), Some(RiskStatus::Mitigated));
  assert_eq!(risk.review_date.as_deref(), Some("2026-10-19"));
  assert!(risk.extra.contains_key("notes"));
  assert_eq!(reloaded.summary.unwrap().total_risks, 1);
}

#[test]
fn mapping_loads_from_disk() {
  let (_dir, paths) = fixture();
  let mapping = ControlMapping::load(&paths.soc2_mapping()).unwrap();
  assert!(mapping.completeness_issues("soc2").is_empty());
  assert!(ControlMapping::load_optional(&paths.iso27001_mapping())
    .unwrap()
    .is_none());
}

#[test]
fn evidence_log_created_on_first_record() {
  let (_dir, paths) = fixture();
  assert!(!paths.evidence_log().exists());
  let now = chrono::Utc::now();
  EvidenceLog::record(
    &paths.evidence_log(),
    compliance_registers::NewEvidence {
      control: "CC7.2".into(),
      event: "CI failure remediated".into(),
      reference: Some("commit abc123".into()),
      ..Default::default()
    },
    now,
  )
  .unwrap();
  let log = EvidenceLog::load(&paths.evidence_log()).unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log.evidence_log[0].reference.as_deref(), Some("commit abc123"));
}
