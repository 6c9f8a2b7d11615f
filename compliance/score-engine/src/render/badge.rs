use crate::types::ScoreResult;

/// Shields-style 150x20 SVG: "compliance" on grey, the score on the band colour.
pub fn render_badge(result: &ScoreResult) -> String {
  let color = escape_attr(&result.color);
  let score = format!("{:.0}%", result.score);
  format!(
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="150" height="20">
  <linearGradient id="b" x2="0" y2="100%">
    <stop offset="0" stop-color="#bbb" stop-opacity=".1"/>
    <stop offset="1" stop-opacity=".1"/>
  </linearGradient>
  <mask id="a">
    <rect width="150" height="20" rx="3" fill="#fff"/>
  </mask>
  <g mask="url(#a)">
    <rect width="85" height="20" fill="#555"/>
    <rect x="85" width="65" height="20" fill="{color}"/>
    <rect width="150" height="20" fill="url(#b)"/>
  </g>
  <g fill="#fff" text-anchor="middle" font-family="DejaVu Sans,Verdana,Geneva,sans-serif" font-size="11">
    <text x="42.5" y="15" fill="#010101" fill-opacity=".3">compliance</text>
    <text x="42.5" y="14">compliance</text>
    <text x="117" y="15" fill="#010101" fill-opacity=".3">{score}</text>
    <text x="117" y="14">{score}</text>
  </g>
</svg>"##
  )
}

fn escape_attr(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('"', "&quot;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}
