//! Which files go into an evidence package and how they are grouped.
//!
//! The built-in plan covers AI governance, compliance mappings, CI/CD
//! workflows, access control, configuration, control matrices and audit-trail
//! scripts. A YAML plan replaces it:
//!
//! ```yaml
//! files:
//!   - .github/CODEOWNERS
//!   - .ai/COMPLIANCE/SOC2_MAPPING.yaml
//! categories:
//!   access_control: [.github/CODEOWNERS]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::manifest::{MANIFEST_NAME, README_NAME};

const DEFAULT_FILES: &[&str] = &[
  ".ai/CLAUDE_RULES.md",
  ".ai/AUTO_MERGE_POLICY.yaml",
  ".ai/AI_CHANGELOG.md",
  ".ai/BOOTSTRAP_PROMPT.md",
  ".ai/COMPLIANCE/SOC2_MAPPING.yaml",
  ".ai/COMPLIANCE/ISO27001_MAPPING.yaml",
  ".ai/COMPLIANCE/CONTROL_EVIDENCE.yaml",
  ".github/workflows/ci.yml",
  ".github/workflows/ai-rules-enforcement.yml",
  ".github/workflows/security.yml",
  ".github/workflows/ai-review.yml",
  ".github/workflows/auto-merge.yml",
  ".github/workflows/self-heal.yml",
  ".github/workflows/cd-staging.yml",
  ".github/workflows/cd-prod.yml",
  ".github/CODEOWNERS",
  "pyproject.toml",
  ".pre-commit-config.yaml",
  "reports/SOC2_Control_Matrix.md",
  "reports/ISO27001_Control_Matrix.md",
  "scripts/ai_engine.py",
  "scripts/ai_rules_audit.py",
  "scripts/pr_self_heal.py",
  "scripts/slack_notifier.py",
  "scripts/ai_metrics.py",
  "scripts/policy_engine.py",
];

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
  (
    "ai_governance",
    &[
      ".ai/CLAUDE_RULES.md",
      ".ai/AUTO_MERGE_POLICY.yaml",
      ".ai/BOOTSTRAP_PROMPT.md",
    ],
  ),
  (
    "change_management",
    &[".github/workflows/ci.yml", ".ai/AI_CHANGELOG.md"],
  ),
  ("access_control", &[".github/CODEOWNERS"]),
  (
    "security_controls",
    &[".github/workflows/security.yml", ".github/workflows/ai-review.yml"],
  ),
  (
    "incident_management",
    &["scripts/pr_self_heal.py", "scripts/slack_notifier.py"],
  ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPlan {
  /// Paths relative to the repository root, in archive order.
  pub files: Vec<String>,
  #[serde(default)]
  pub categories: BTreeMap<String, Vec<String>>,
}

impl Default for ExportPlan {
  fn default() -> Self {
    Self {
      files: DEFAULT_FILES.iter().map(|s| s.to_string()).collect(),
      categories: DEFAULT_CATEGORIES
        .iter()
        .map(|(name, files)| {
          (
            name.to_string(),
            files.iter().map(|s| s.to_string()).collect(),
          )
        })
        .collect(),
    }
  }
}

impl ExportPlan {
  pub fn new(files: Vec<String>) -> Self {
    Self {
      files,
      categories: BTreeMap::new(),
    }
  }

  pub fn load(path: &Path) -> Result<Self> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
      ErrorKind::NotFound => ExportError::not_found(path),
      _ => ExportError::io(path, e),
    })?;
    let plan: Self = serde_yaml::from_str(&text).map_err(|source| ExportError::Yaml {
      path: path.to_path_buf(),
      source,
    })?;
    tracing::debug!(path = %path.display(), files = plan.files.len(), "loaded export plan");
    plan.validate()?;
    Ok(plan)
  }

  /// The plan must list at least one file and no archive name twice
  /// (`./a` and `a` are the same entry).
  pub fn validate(&self) -> Result<()> {
    if self.files.is_empty() {
      return Err(ExportError::validation("files", "plan lists no files"));
    }
    let mut seen = HashSet::new();
    for f in &self.files {
      // Unusable paths are rejected per file at export time.
      let key = archive_name(f).unwrap_or_else(|_| f.clone());
      if !seen.insert(key) {
        return Err(ExportError::validation(f, "listed twice"));
      }
    }
    for (name, members) in &self.categories {
      for m in members {
        let key = archive_name(m).unwrap_or_else(|_| m.clone());
        if !seen.contains(&key) {
          tracing::warn!(category = %name, file = %m, "category file is not in the plan");
        }
      }
    }
    Ok(())
  }
}

/// The `/`-joined name `path` is stored under in the archive.
///
/// Fails for empty, absolute or escaping paths, and for the names the
/// package reserves for its own manifest and README.
pub fn archive_name(path: &str) -> Result<String> {
  if path.trim().is_empty() {
    return Err(ExportError::validation(path, "empty path"));
  }
  let mut parts = Vec::new();
  for component in Path::new(path).components() {
    match component {
      Component::Normal(part) => parts.push(part.to_string_lossy()),
      Component::CurDir => {}
      Component::ParentDir => {
        return Err(ExportError::validation(path, "path escapes the repository root"))
      }
      Component::RootDir | Component::Prefix(_) => {
        return Err(ExportError::validation(path, "path must be relative"))
      }
    }
  }
  if parts.is_empty() {
    return Err(ExportError::validation(path, "path names no file"));
  }
  let name = parts.join("/");
  if name == MANIFEST_NAME || name == README_NAME {
    return Err(ExportError::validation(path, "name is reserved for the package"));
  }
  Ok(name)
}
