//! Binary entrypoint: risk register and evidence log maintenance.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};

use compliance_registers::issue::has_errors;
use compliance_registers::{EvidenceLog, NewEvidence, Paths, RiskRegister, RiskStatus};

#[derive(Parser, Debug)]
#[command(name = "compliance-registers", version, about = "Risk register and evidence log tools")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// ISO 27001 risk register.
  Risk {
    #[command(subcommand)]
    command: RiskCommands,
  },
  /// SOC-2 Type II evidence log.
  Evidence {
    #[command(subcommand)]
    command: EvidenceCommands,
  },
}

#[derive(Subcommand, Debug)]
enum RiskCommands {
  /// Check required fields and allowed values (exit 1 on errors).
  Validate,
  /// Counts by level and status.
  Summary,
  /// Overdue and upcoming reviews.
  Reviews,
  /// Markdown report.
  Report {
    #[arg(long, short)]
    output: Option<PathBuf>,
  },
  /// Move a risk to a new status and stamp its review date.
  Update {
    risk_id: String,
    #[arg(long)]
    status: RiskStatus,
  },
}

#[derive(Subcommand, Debug)]
enum EvidenceCommands {
  /// Append one evidence entry.
  Record {
    #[arg(long)]
    control: String,
    #[arg(long)]
    event: String,
    #[arg(long)]
    repo: Option<String>,
    #[arg(long = "ref")]
    reference: Option<String>,
    #[arg(long)]
    actor: Option<String>,
    /// Extra details as key=value (repeatable).
    #[arg(long = "detail", value_parser = parse_detail)]
    details: Vec<(String, String)>,
  },
  /// Totals by control and repository.
  Stats,
  /// Markdown report.
  Report {
    #[arg(long, short)]
    output: Option<PathBuf>,
  },
}

fn parse_detail(raw: &str) -> Result<(String, String), String> {
  raw
    .split_once('=')
    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
    .filter(|(k, _)| !k.is_empty())
    .ok_or_else(|| format!("expected key=value, got '{}'", raw))
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
      let _ = writeln!(io::stderr(), "compliance-registers error: {:#}", e);
      std::process::exit(1);
    }
  }
}

fn run_binary() -> anyhow::Result<i32> {
  let cli = Cli::parse();
  let paths = Paths::from_env();
  match cli.command {
    Commands::Risk { command } => run_risk(&paths, command),
    Commands::Evidence { command } => run_evidence(&paths, command),
  }
}

fn run_risk(paths: &Paths, command: RiskCommands) -> anyhow::Result<i32> {
  let path = paths.risk_register();
  let mut register = RiskRegister::load(&path)?;
  let today = Utc::now().date_naive();
  let mut out = io::stdout().lock();

  match command {
    RiskCommands::Validate => {
      let issues = register.validate();
      if issues.is_empty() {
        writeln!(out, "[OK] Risk register is valid")?;
        return Ok(0);
      }
      for issue in &issues {
        writeln!(out, "  {}", issue)?;
      }
      writeln!(out, "\n{} issue(s) found", issues.len())?;
      Ok(if has_errors(&issues) { 1 } else { 0 })
    }
    RiskCommands::Summary => {
      let summary = register.summary();
      writeln!(out, "Total Risks: {}", summary.total_risks)?;
      writeln!(out, "\nBy Level:")?;
      for (level, count) in &summary.by_level {
        writeln!(out, "  {}: {}", level, count)?;
      }
      writeln!(out, "\nBy Status:")?;
      for (status, count) in summary.by_status.iter().filter(|(_, c)| **c > 0) {
        writeln!(out, "  {}: {}", status, count)?;
      }
      Ok(0)
    }
    RiskCommands::Reviews => {
      let alerts = register.check_reviews(today);
      if alerts.is_empty() {
        writeln!(out, "[OK] All reviews are current")?;
      }
      for alert in &alerts {
        writeln!(out, "  {}", alert)?;
      }
      Ok(0)
    }
    RiskCommands::Report { output } => {
      let report = register.render_report(today);
      write_or_print(&mut out, output, &report)?;
      Ok(0)
    }
    RiskCommands::Update { risk_id, status } => {
      let transition = register.update_status(&risk_id, status, today)?;
      register.save(&path)?;
      writeln!(out, "[OK] Updated {}", transition)?;
      Ok(0)
    }
  }
}

fn run_evidence(paths: &Paths, command: EvidenceCommands) -> anyhow::Result<i32> {
  let path = paths.evidence_log();
  let now = Utc::now();
  let mut out = io::stdout().lock();

  match command {
    EvidenceCommands::Record {
      control,
      event,
      repo,
      reference,
      actor,
      details,
    } => {
      let new = NewEvidence {
        control,
        event,
        repo,
        reference,
        actor,
        details: details.into_iter().collect::<BTreeMap<_, _>>(),
      };
      let entry = EvidenceLog::record(&path, new, now)?;
      writeln!(out, "[OK] Evidence recorded: {} - {}", entry.control, entry.event)?;
      Ok(0)
    }
    EvidenceCommands::Stats => {
      let log = EvidenceLog::load_or_empty(&path, now)?;
      let stats = log.statistics();
      if stats.total == 0 {
        writeln!(out, "No evidence collected yet")?;
        return Ok(0);
      }
      serde_json::to_writer_pretty(&mut out, &stats)?;
      writeln!(out)?;
      Ok(0)
    }
    EvidenceCommands::Report { output } => {
      let log = EvidenceLog::load_or_empty(&path, now)?;
      write_or_print(&mut out, output, &log.render_report(now))?;
      Ok(0)
    }
  }
}

fn write_or_print(out: &mut impl Write, output: Option<PathBuf>, text: &str) -> anyhow::Result<()> {
  match output {
    Some(path) => {
      if path.as_os_str().is_empty() {
        bail!("empty output path");
      }
      fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
      writeln!(out, "[OK] Report saved to: {}", path.display())?;
    }
    None => writeln!(out, "{}", text)?,
  }
  Ok(())
}
