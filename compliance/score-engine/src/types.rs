//! Score engine inputs and the structured result.

use std::collections::BTreeMap;

use serde::Serialize;

/// What a category contributes: counted controls, or a fixed percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryInput {
  Counts { total: u32, implemented: u32 },
  Override { percent: f64 },
}

/// Something keeping a category below 100%.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Gap {
  pub category: String,
  pub id: String,
  pub description: String,
}

impl Gap {
  pub fn new(category: &str, id: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      category: category.to_string(),
      id: id.into(),
      description: description.into(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryData {
  pub input: CategoryInput,
  pub gaps: Vec<Gap>,
}

impl CategoryData {
  pub fn counts(total: u32, implemented: u32) -> Self {
    Self {
      input: CategoryInput::Counts { total, implemented },
      gaps: Vec::new(),
    }
  }

  pub fn with_gaps(mut self, gaps: Vec<Gap>) -> Self {
    self.gaps = gaps;
    self
  }
}

/// Collected inputs keyed by category id.
pub type Inputs = BTreeMap<String, CategoryData>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
  pub id: String,
  /// Percentage in [0, 100], one decimal.
  pub score: f64,
  pub weight: f64,
  /// `weight * score / 100`, one decimal.
  pub weighted: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub implemented: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total: Option<u32>,
  /// No controls to measure; contributes 0.
  pub no_data: bool,
  pub overridden: bool,
}

impl CategoryScore {
  /// "soc2_controls" -> "Soc2 Controls".
  pub fn display_name(&self) -> String {
    self
      .id
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
}

/// Output of one scoring pass. Contains no timestamps, so identical input
/// always yields an identical result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
  /// Overall score in [0, 100], one decimal.
  pub score: f64,
  pub label: String,
  pub color: String,
  pub categories: Vec<CategoryScore>,
  pub gaps: Vec<Gap>,
  /// blake3 digest of the category inputs.
  pub input_digest: String,
}

impl ScoreResult {
  pub fn category(&self, id: &str) -> Option<&CategoryScore> {
    self.categories.iter().find(|c| c.id == id)
  }

  pub fn no_data_categories(&self) -> impl Iterator<Item = &CategoryScore> {
    self.categories.iter().filter(|c| c.no_data)
  }
}
