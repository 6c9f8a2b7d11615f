use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::types::ScoreResult;

pub(super) fn render_markdown(result: &ScoreResult, generated_at: DateTime<Utc>) -> String {
  let mut md = String::new();
  let _ = writeln!(md, "# Compliance Score Report");
  let _ = writeln!(md);
  let _ = writeln!(md, "**Generated:** {}", super::timestamp(generated_at));
  let _ = writeln!(md);
  let _ = writeln!(
    md,
    "**Overall score:** {:.1}/100 ({})",
    result.score, result.label
  );
  let _ = writeln!(md);
  let _ = writeln!(md, "## Components");
  let _ = writeln!(md);
  let _ = writeln!(md, "| Component | Score | Weight | Weighted | Controls |");
  let _ = writeln!(md, "|---|---:|---:|---:|---|");
  for c in &result.categories {
    let controls = match (c.implemented, c.total) {
      _ if c.overridden => "override".to_string(),
      _ if c.no_data => "no data".to_string(),
      (Some(i), Some(t)) => format!("{}/{}", i, t),
      _ => "-".to_string(),
    };
    let _ = writeln!(
      md,
      "| {} | {:.1}% | {}% | {:.1} | {} |",
      c.display_name(),
      c.score,
      c.weight,
      c.weighted,
      controls
    );
  }

  let _ = writeln!(md);
  let _ = writeln!(md, "## Gaps");
  let _ = writeln!(md);
  if result.gaps.is_empty() {
    let _ = writeln!(md, "None.");
  } else {
    for gap in &result.gaps {
      let _ = writeln!(
        md,
        "- `{}` **{}**: {}",
        gap.category, gap.id, gap.description
      );
    }
  }
  let _ = writeln!(md);
  let _ = writeln!(md, "_Input digest: `{}`_", result.input_digest);
  md
}
