//! Security questionnaires: per-file question status counts.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Mapping;

use crate::error::{RegisterError, Result};
use crate::yaml;

#[derive(Debug, Clone, Deserialize)]
pub struct Question {
  #[serde(default)]
  pub id: Option<String>,
  #[serde(default)]
  pub question: String,
  #[serde(default)]
  pub status: String,
}

impl Question {
  pub fn is_implemented(&self) -> bool {
    self.status.trim().eq_ignore_ascii_case("implemented")
  }
}

#[derive(Debug, Clone)]
pub struct Questionnaire {
  pub name: String,
  pub questions: Vec<Question>,
}

impl Questionnaire {
  pub fn total(&self) -> u32 {
    self.questions.len() as u32
  }

  pub fn implemented(&self) -> u32 {
    self.questions.iter().filter(|q| q.is_implemented()).count() as u32
  }

  /// Questions listed under the file-stem key, falling back to `questions`.
  fn from_document(name: &str, doc: &Mapping) -> Result<Self> {
    let list = doc.get(name).or_else(|| doc.get("questions"));
    let questions = match list {
      Some(v) => serde_yaml::from_value(v.clone())
        .map_err(|e| RegisterError::validation(name, &format!("questions: {}", e)))?,
      None => Vec::new(),
    };
    Ok(Self {
      name: name.to_string(),
      questions,
    })
  }
}

/// Load every `*.yaml` questionnaire in `dir`, sorted by name.
///
/// Returns `Ok(None)` when the directory does not exist.
pub fn load_dir(dir: &Path) -> Result<Option<Vec<Questionnaire>>> {
  let entries = match fs::read_dir(dir) {
    Ok(it) => it,
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(RegisterError::io(dir, e)),
  };

  let mut out = Vec::new();
  for entry in entries {
    let path = entry.map_err(|e| RegisterError::io(dir, e))?.path();
    let is_yaml = path
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if !is_yaml {
      continue;
    }
    let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
      continue;
    };
    let doc: Option<Mapping> = yaml::read(&path)?;
    let q = Questionnaire::from_document(name, &doc.unwrap_or_default())?;
    tracing::debug!(name = %q.name, questions = q.questions.len(), "loaded questionnaire");
    out.push(q);
  }
  out.sort_by(|a, b| a.name.cmp(&b.name));
  Ok(Some(out))
}
