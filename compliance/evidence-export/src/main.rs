//! Binary entrypoint: build or verify a compliance evidence package.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;

use evidence_export::{verify_archive, ExportPlan, Exporter};

#[derive(Parser, Debug)]
#[command(name = "evidence-export", version, about = "Export compliance evidence package")]
struct Cli {
  /// Repository root the plan's paths are relative to.
  #[arg(long, env = "COMPLIANCE_REPO_ROOT", default_value = ".")]
  root: PathBuf,
  /// Output zip (default: Compliance_Evidence_Package_<timestamp>.zip under the root).
  #[arg(long, short)]
  output: Option<PathBuf>,
  /// YAML plan replacing the built-in file list.
  #[arg(long)]
  plan: Option<PathBuf>,
  /// List files that would be included (dry run).
  #[arg(long, short)]
  list: bool,
  /// Check an existing package against its manifest.
  #[arg(long, value_name = "ZIP", conflicts_with_all = ["list", "output", "plan"])]
  verify: Option<PathBuf>,
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
      let _ = writeln!(io::stderr(), "evidence-export error: {:#}", e);
      std::process::exit(1);
    }
  }
}

fn run_binary() -> anyhow::Result<i32> {
  let cli = Cli::parse();
  let rule = "=".repeat(60);
  let mut out = io::stdout().lock();

  if let Some(zip) = &cli.verify {
    let report = verify_archive(zip)?;
    for problem in &report.problems {
      writeln!(out, "  [FAIL] {}", problem)?;
    }
    if !report.manifest.missing_files.is_empty() {
      writeln!(
        out,
        "  {} file(s) were missing at export time",
        report.manifest.missing_files.len()
      )?;
    }
    if report.is_ok() {
      writeln!(out, "[OK] {} file(s) match MANIFEST.json", report.checked)?;
      return Ok(0);
    }
    writeln!(out, "\n{} problem(s) found", report.problems.len())?;
    return Ok(1);
  }

  let plan = match &cli.plan {
    Some(path) => ExportPlan::load(path)?,
    None => ExportPlan::default(),
  };
  let exporter = Exporter::new(&cli.root, Utc::now());

  if cli.list {
    writeln!(out, "Files that would be included:\n{}", rule)?;
    for f in exporter.list(&plan) {
      let status = if f.present { "[OK]" } else { "[MISSING]" };
      writeln!(out, "  {} {}", status, f.path)?;
    }
    return Ok(0);
  }

  writeln!(out, "Compliance Evidence Export\n{}", rule)?;
  let output = cli.output.clone().unwrap_or_else(|| exporter.default_output());
  let report = exporter.export(&plan, &output)?;

  writeln!(out, "\n[OK] Evidence package created: {}", report.output.display())?;
  writeln!(out, "  - Files included: {}", report.included())?;
  writeln!(out, "  - Files missing: {}", report.manifest.missing_files.len())?;
  if !report.failures.is_empty() {
    writeln!(out, "\nNot archived:")?;
    for failure in &report.failures {
      writeln!(out, "  - {}", failure)?;
    }
    let _ = writeln!(
      io::stderr(),
      "evidence-export error: {} of {} evidence file(s) not archived",
      report.failures.len(),
      plan.files.len()
    );
    return Ok(1);
  }
  writeln!(out, "\n{}\nPackage ready for SOC-2 and ISO 27001 auditors.\n{}", rule, rule)?;
  Ok(0)
}
