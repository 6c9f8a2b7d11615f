//! Binary entrypoint: compute the compliance score and write reports.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use compliance_registers::issue::has_errors;
use compliance_registers::{Issue, Paths};
use score_engine::{render, run, validate, ReportFormat, ScoreConfig};

#[derive(Parser, Debug)]
#[command(name = "compliance-score", version, about = "Compliance score engine")]
struct Cli {
  /// Check mapping completeness and weights (exit 1 on errors).
  #[arg(long)]
  validate: bool,
  /// Save the report; format follows the extension (.json, .md, .svg, else table).
  #[arg(long, short = 'o')]
  report: Option<PathBuf>,
  /// Print JSON instead of the table.
  #[arg(long, short = 'j')]
  json: bool,
  /// Write an SVG badge.
  #[arg(long, short = 'b')]
  badge: Option<PathBuf>,
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    )
    .with_writer(io::stderr)
    .init();

  match run_binary() {
    Ok(code) => std::process::exit(code),
    Err(e) => {
      let _ = writeln!(io::stderr(), "compliance-score error: {:#}", e);
      std::process::exit(1);
    }
  }
}

fn run_binary() -> anyhow::Result<i32> {
  let cli = Cli::parse();
  let paths = Paths::from_env();
  let config = ScoreConfig::load(&paths.score_config())?;
  let mut out = io::stdout().lock();

  if cli.validate {
    let issues = validate(&paths, &config);
    // Keep stdout machine-readable when JSON follows.
    if cli.json {
      print_issues(&mut io::stderr().lock(), &issues)?;
    } else {
      print_issues(&mut out, &issues)?;
    }
    if has_errors(&issues) {
      return Ok(1);
    }
    if cli.report.is_none() && !cli.json && cli.badge.is_none() {
      return Ok(0);
    }
  }

  let result = run(&paths, &config)?;
  let now = Utc::now();

  if let Some(path) = &cli.badge {
    write_file(path, &render(&result, ReportFormat::Badge, now)?)?;
    writeln!(out, "[OK] Badge saved to: {}", path.display())?;
  }

  match &cli.report {
    Some(path) => {
      let format = ReportFormat::from_path(path);
      write_file(path, &render(&result, format, now)?)?;
      writeln!(out, "[OK] Report saved to: {}", path.display())?;
    }
    None if cli.json => writeln!(out, "{}", render(&result, ReportFormat::Json, now)?)?,
    None if cli.badge.is_none() => {
      writeln!(out, "{}", render(&result, ReportFormat::Table, now)?)?
    }
    None => {}
  }
  Ok(0)
}

fn print_issues(w: &mut impl Write, issues: &[Issue]) -> io::Result<()> {
  if issues.is_empty() {
    return writeln!(w, "[OK] Compliance sources are complete");
  }
  for issue in issues {
    writeln!(w, "  {}", issue)?;
  }
  writeln!(w, "\n{} issue(s) found", issues.len())
}

fn write_file(path: &Path, text: &str) -> anyhow::Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}
