use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

const RULE: &str =
  "================================================================================";

fn section(out: &mut String, title: &str) {
  let _ = writeln!(out, "{}\n{}\n{}\n", RULE, title, RULE);
}

/// Plain-text guide for auditors opening the package.
pub fn auditor_readme(
  generated_at: DateTime<Utc>,
  categories: &BTreeMap<String, Vec<String>>,
) -> String {
  let mut out = String::new();
  section(&mut out, "COMPLIANCE EVIDENCE PACKAGE");
  let _ = writeln!(out, "Generated: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

  section(&mut out, "PACKAGE CONTENTS");
  let _ = writeln!(out, "This package contains evidence for:\n");
  let _ = writeln!(out, "1. SOC-2 Trust Service Criteria");
  let _ = writeln!(out, "   - Control mapping: .ai/COMPLIANCE/SOC2_MAPPING.yaml");
  let _ = writeln!(out, "   - Control matrix: reports/SOC2_Control_Matrix.md\n");
  let _ = writeln!(out, "2. ISO 27001:2022 Annex A");
  let _ = writeln!(out, "   - Control mapping: .ai/COMPLIANCE/ISO27001_MAPPING.yaml");
  let _ = writeln!(out, "   - Control matrix: reports/ISO27001_Control_Matrix.md\n");

  if !categories.is_empty() {
    section(&mut out, "EVIDENCE CATEGORIES");
    for (idx, (name, files)) in categories.iter().enumerate() {
      let _ = writeln!(out, "{}. {}", idx + 1, name.replace('_', " ").to_uppercase());
      for f in files {
        let _ = writeln!(out, "   - {}", f);
      }
      let _ = writeln!(out);
    }
  }

  section(&mut out, "FILE INTEGRITY");
  let _ = writeln!(
    out,
    "All files are hashed with SHA-256. See MANIFEST.json for verification.\n"
  );
  let _ = writeln!(out, "To verify file integrity:");
  let _ = writeln!(out, "1. Extract the package");
  let _ = writeln!(out, "2. Compare each file's SHA-256 hash with MANIFEST.json");
  let _ = writeln!(out, "   (or run: evidence-export --verify <package.zip>)\n");
  let _ = writeln!(out, "{}", RULE);
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn lists_categories_in_order() {
    let mut cats = BTreeMap::new();
    cats.insert("access_control".to_string(), vec![".github/CODEOWNERS".to_string()]);
    cats.insert("ai_governance".to_string(), vec![".ai/CLAUDE_RULES.md".to_string()]);
    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    let text = auditor_readme(at, &cats);
    assert!(text.contains("Generated: 2026-01-02 03:04:05 UTC"));
    assert!(text.contains("1. ACCESS CONTROL\n   - .github/CODEOWNERS"));
    assert!(text.contains("2. AI GOVERNANCE"));
  }
}
