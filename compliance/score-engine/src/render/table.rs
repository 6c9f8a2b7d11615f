use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::types::ScoreResult;

const WIDTH: usize = 60;

pub(super) fn render_table(result: &ScoreResult, generated_at: DateTime<Utc>) -> String {
  let rule = "=".repeat(WIDTH);
  let thin = "-".repeat(WIDTH);
  let mut out = String::new();

  // Writing into a String cannot fail.
  let _ = writeln!(out, "{}", rule);
  let _ = writeln!(out, "COMPLIANCE SCORE REPORT");
  let _ = writeln!(out, "{}", rule);
  let _ = writeln!(out, "Generated: {}", super::timestamp(generated_at));
  let _ = writeln!(out);
  let _ = writeln!(
    out,
    "OVERALL SCORE: {:.1}/100 ({})",
    result.score, result.label
  );
  let _ = writeln!(out, "{}", thin);
  let _ = writeln!(out);
  let _ = writeln!(out, "COMPONENT BREAKDOWN");
  let _ = writeln!(out, "{}", thin);
  let _ = writeln!(
    out,
    "{:<30} {:>8} {:>8} {:>10}",
    "Component", "Score", "Weight", "Weighted"
  );
  let _ = writeln!(out, "{}", thin);
  for c in &result.categories {
    let mut name = c.display_name();
    if c.no_data {
      name.push_str(" (no data)");
    } else if c.overridden {
      name.push_str(" (override)");
    }
    let _ = writeln!(
      out,
      "{:<30} {:>7.1}% {:>7}% {:>10.1}",
      name, c.score, c.weight, c.weighted
    );
  }
  let _ = writeln!(out, "{}", thin);
  let _ = writeln!(
    out,
    "{:<30} {:<8} {:>8} {:>10.1}",
    "TOTAL", "", "100%", result.score
  );

  if !result.gaps.is_empty() {
    let _ = writeln!(out);
    let _ = writeln!(out, "GAPS ({})", result.gaps.len());
    let _ = writeln!(out, "{}", thin);
    for gap in &result.gaps {
      let _ = writeln!(out, "  [{}] {}: {}", gap.category, gap.id, gap.description);
    }
  }

  let _ = writeln!(out);
  let _ = write!(out, "{}", rule);
  out
}
