//! Weighted score aggregation.

use crate::config::ScoreConfig;
use crate::error::ScoreError;
use crate::types::{CategoryInput, CategoryScore, Gap, Inputs, ScoreResult};

fn round1(v: f64) -> f64 {
  (v * 10.0).round() / 10.0
}

/// Percentage for one category, and whether it had anything to measure.
fn category_percent(id: &str, input: &CategoryInput) -> Result<(f64, bool), ScoreError> {
  match *input {
    CategoryInput::Override { percent } => {
      if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(ScoreError::validation(
          id,
          &format!("override must be within [0, 100], got {}", percent),
        ));
      }
      Ok((percent, false))
    }
    CategoryInput::Counts { total: 0, .. } => Ok((0.0, true)),
    CategoryInput::Counts { total, implemented } => {
      if implemented > total {
        return Err(ScoreError::validation(
          id,
          &format!("implemented ({}) exceeds total ({})", implemented, total),
        ));
      }
      Ok((implemented as f64 / total as f64 * 100.0, false))
    }
  }
}

/// Compute `Σ weight_i * implemented_i / total_i` over the configured categories.
///
/// Every configured category needs either a configured override or an entry
/// in `inputs`; otherwise this fails naming the category.
pub fn compute(config: &ScoreConfig, inputs: &Inputs) -> Result<ScoreResult, ScoreError> {
  config.validate_weights()?;

  let mut hasher = blake3::Hasher::new();
  let mut categories = Vec::with_capacity(config.categories.len());
  let mut gaps: Vec<Gap> = Vec::new();
  let mut total = 0.0;

  for cw in &config.categories {
    let (input, overridden) = match config.overrides.get(&cw.id) {
      Some(&percent) => (CategoryInput::Override { percent }, true),
      None => {
        let data = inputs
          .get(&cw.id)
          .ok_or_else(|| ScoreError::validation(&cw.id, "no category data"))?;
        gaps.extend(data.gaps.iter().cloned());
        (data.input, false)
      }
    };

    let (percent, no_data) = category_percent(&cw.id, &input)?;
    let weighted = cw.weight * percent / 100.0;
    total += weighted;

    hasher.update(cw.id.as_bytes());
    hasher.update(b"|");
    hasher.update(&cw.weight.to_le_bytes());
    match input {
      CategoryInput::Counts { total, implemented } => {
        hasher.update(format!("|{}/{}", implemented, total).as_bytes());
      }
      CategoryInput::Override { percent } => {
        hasher.update(b"|=");
        hasher.update(&percent.to_le_bytes());
      }
    }
    hasher.update(b"\n");

    let (implemented, count_total) = match input {
      CategoryInput::Counts { total, implemented } => (Some(implemented), Some(total)),
      CategoryInput::Override { .. } => (None, None),
    };

    if no_data {
      tracing::warn!(category = %cw.id, "category has no controls to measure");
    }

    categories.push(CategoryScore {
      id: cw.id.clone(),
      score: round1(percent),
      weight: cw.weight,
      weighted: round1(weighted),
      implemented,
      total: count_total,
      no_data,
      overridden,
    });
  }

  let score = total.clamp(0.0, 100.0);
  let (label, color) = config.band(score);
  gaps.sort();

  let hex = hasher.finalize().to_hex();
  Ok(ScoreResult {
    score: round1(score),
    label: label.to_string(),
    color: color.to_string(),
    categories,
    gaps,
    input_digest: hex.as_str()[..32].to_string(),
  })
}
