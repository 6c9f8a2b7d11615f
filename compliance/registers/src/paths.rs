//! Locations of the compliance sources, passed explicitly to every loader.

use std::env;
use std::path::{Path, PathBuf};

/// Default compliance directory, relative to the repository root.
pub const DEFAULT_COMPLIANCE_DIR: &str = ".ai/COMPLIANCE";

#[derive(Debug, Clone)]
pub struct Paths {
  /// Repository root; workflow checks resolve against it.
  pub repo_root: PathBuf,
  /// Directory holding the mapping, register and log files.
  pub compliance_dir: PathBuf,
}

impl Paths {
  pub fn new(repo_root: impl Into<PathBuf>) -> Self {
    let repo_root = repo_root.into();
    let compliance_dir = repo_root.join(DEFAULT_COMPLIANCE_DIR);
    Self {
      repo_root,
      compliance_dir,
    }
  }

  /// `COMPLIANCE_REPO_ROOT` (default `.`) and `COMPLIANCE_DIR`
  /// (default `<root>/.ai/COMPLIANCE`).
  pub fn from_env() -> Self {
    let root = env::var_os("COMPLIANCE_REPO_ROOT")
      .map(PathBuf::from)
      .unwrap_or_else(|| PathBuf::from("."));
    let mut paths = Self::new(root);
    if let Some(dir) = env::var_os("COMPLIANCE_DIR") {
      paths.compliance_dir = PathBuf::from(dir);
    }
    paths
  }

  pub fn score_config(&self) -> PathBuf {
    self.compliance_dir.join("COMPLIANCE_SCORE.yaml")
  }

  pub fn soc2_mapping(&self) -> PathBuf {
    self.compliance_dir.join("SOC2_MAPPING.yaml")
  }

  pub fn iso27001_mapping(&self) -> PathBuf {
    self.compliance_dir.join("ISO27001_MAPPING.yaml")
  }

  pub fn risk_register(&self) -> PathBuf {
    self.compliance_dir.join("ISO_RISK_REGISTER.yaml")
  }

  pub fn evidence_log(&self) -> PathBuf {
    self.compliance_dir.join("SOC2_EVIDENCE_LOG.yaml")
  }

  pub fn questionnaires_dir(&self) -> PathBuf {
    self.compliance_dir.join("QUESTIONNAIRES")
  }

  pub fn in_repo(&self, relative: impl AsRef<Path>) -> PathBuf {
    self.repo_root.join(relative)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn layout_under_root() {
    let p = Paths::new("/repo");
    assert_eq!(p.compliance_dir, PathBuf::from("/repo/.ai/COMPLIANCE"));
    assert_eq!(
      p.risk_register(),
      PathBuf::from("/repo/.ai/COMPLIANCE/ISO_RISK_REGISTER.yaml")
    );
    assert_eq!(p.in_repo(".github/CODEOWNERS"), PathBuf::from("/repo/.github/CODEOWNERS"));
  }
}
