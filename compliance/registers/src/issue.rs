//! Validation findings shared by the register checks.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
  Warning,
  Error,
}

/// One finding from a register check, tied to the record it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
  pub level: IssueLevel,
  pub subject: String,
  pub message: String,
}

impl Issue {
  pub fn error(subject: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      level: IssueLevel::Error,
      subject: subject.into(),
      message: message.into(),
    }
  }

  pub fn warning(subject: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      level: IssueLevel::Warning,
      subject: subject.into(),
      message: message.into(),
    }
  }

  pub fn is_error(&self) -> bool {
    self.level == IssueLevel::Error
  }
}

impl fmt::Display for Issue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let tag = match self.level {
      IssueLevel::Error => "[-]",
      IssueLevel::Warning => "[!]",
    };
    write!(f, "{} {}: {}", tag, self.subject, self.message)
  }
}

/// True when any finding is an error.
pub fn has_errors(issues: &[Issue]) -> bool {
  issues.iter().any(Issue::is_error)
}
